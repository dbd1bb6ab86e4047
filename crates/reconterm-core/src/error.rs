//! Error taxonomy for the terminal subsystem.
//!
//! None of these escalate: every variant is caught at the operation that
//! started the async call and turned into a scrollback line, a banner, or a
//! log record.

use thiserror::Error;

use crate::headers::{COEP_HEADER, COEP_VALUE, COOP_HEADER, COOP_VALUE};

/// Terminal failure of the sandbox bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    /// The page is not cross-origin isolated; the boot primitive was never called.
    #[error(
        "Cross-origin isolation is required to boot an in-browser WebContainer. \
         Please set `{}: {}` and `{}: {}` on the host.",
        COEP_HEADER,
        COEP_VALUE,
        COOP_HEADER,
        COOP_VALUE
    )]
    IsolationRequired,
    /// The boot or mount call rejected.
    #[error("{0}")]
    BootFailure(String),
}

impl BootError {
    /// Short kind label for structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::IsolationRequired => "isolation_required",
            Self::BootFailure(_) => "boot_failure",
        }
    }
}

/// Failure spawning or streaming a command after a successful boot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("{0}")]
    Spawn(String),
    #[error("output stream failed: {0}")]
    Stream(String),
    #[error("process exit unavailable: {0}")]
    Exit(String),
}

/// Clipboard write failure. Logged only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard API unavailable")]
    Unavailable,
    #[error("clipboard write rejected: {0}")]
    Rejected(String),
}

/// Everything a submission can report inline in the scrollback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminalError {
    #[error("Terminal environment not ready (WebContainer booting...)")]
    EnvironmentNotReady,
    #[error(transparent)]
    Boot(#[from] BootError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

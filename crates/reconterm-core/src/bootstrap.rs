//! Lazy, at-most-once sandbox bootstrap.
//!
//! # State machine
//!
//! ```text
//! Absent ──ensure_booted()──▶ Booting ──ok──▶ Ready
//!    │                           └──err──▶ Failed(BootFailure)
//!    └──(not isolated)──────────────────▶ Failed(IsolationRequired)
//! ```
//!
//! `Ready` and `Failed` are terminal for the process. The `Booting` marker is
//! written before the first suspension point, so a second caller that arrives
//! while the boot call is pending returns immediately instead of booting
//! again. Waiters are not queued.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::config::SeedFiles;
use crate::error::{BootError, TerminalError};
use crate::isolation::IsolationState;
use crate::sandbox::{Sandbox, SandboxRuntime};

enum BootState<S> {
    Absent,
    Booting,
    Ready(Rc<S>),
    Failed(BootError),
}

/// Observable bootstrap status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootStatus {
    Absent,
    Booting,
    Ready,
    Failed(BootError),
}

impl BootStatus {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Booting => "booting",
            Self::Ready => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

/// Process-wide owner of the sandbox handle.
///
/// Constructed once by the composition root and shared with every
/// [`crate::TerminalSession`] through an `Rc`.
pub struct Bootstrapper<R: SandboxRuntime> {
    runtime: R,
    isolation: IsolationState,
    seed: SeedFiles,
    state: RefCell<BootState<R::Sandbox>>,
}

impl<R: SandboxRuntime> Bootstrapper<R> {
    #[must_use]
    pub fn new(runtime: R, isolation: IsolationState) -> Self {
        Self::with_seed(runtime, isolation, SeedFiles::default())
    }

    #[must_use]
    pub fn with_seed(runtime: R, isolation: IsolationState, seed: SeedFiles) -> Self {
        Self {
            runtime,
            isolation,
            seed,
            state: RefCell::new(BootState::Absent),
        }
    }

    #[must_use]
    pub fn isolation(&self) -> IsolationState {
        self.isolation
    }

    #[must_use]
    pub fn status(&self) -> BootStatus {
        match &*self.state.borrow() {
            BootState::Absent => BootStatus::Absent,
            BootState::Booting => BootStatus::Booting,
            BootState::Ready(_) => BootStatus::Ready,
            BootState::Failed(err) => BootStatus::Failed(err.clone()),
        }
    }

    /// True until the bootstrap reaches a terminal state.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.status().is_terminal()
    }

    /// The terminal boot error, if any.
    #[must_use]
    pub fn error(&self) -> Option<BootError> {
        match &*self.state.borrow() {
            BootState::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// The sandbox handle, or the reason it cannot be used yet.
    pub fn handle(&self) -> Result<Rc<R::Sandbox>, TerminalError> {
        match &*self.state.borrow() {
            BootState::Ready(sandbox) => Ok(Rc::clone(sandbox)),
            BootState::Failed(err) => Err(TerminalError::Boot(err.clone())),
            BootState::Absent | BootState::Booting => Err(TerminalError::EnvironmentNotReady),
        }
    }

    /// Boot the sandbox unless a boot has already started.
    pub async fn ensure_booted(&self) {
        {
            let mut state = self.state.borrow_mut();
            if !matches!(*state, BootState::Absent) {
                return;
            }
            if !self.isolation.is_isolated() {
                warn!("page is not cross-origin isolated; sandbox boot skipped");
                *state = BootState::Failed(BootError::IsolationRequired);
                return;
            }
            *state = BootState::Booting;
        }

        debug!("booting sandbox");
        let outcome = self.boot_and_mount().await;

        let mut state = self.state.borrow_mut();
        *state = match outcome {
            Ok(sandbox) => {
                info!("sandbox booted");
                BootState::Ready(Rc::new(sandbox))
            }
            Err(err) => {
                error!(kind = err.kind(), error = %err, "failed to boot sandbox");
                BootState::Failed(err)
            }
        };
    }

    async fn boot_and_mount(&self) -> Result<R::Sandbox, BootError> {
        let sandbox = self
            .runtime
            .boot()
            .await
            .map_err(|err| BootError::BootFailure(err.to_string()))?;
        let files = self
            .seed
            .to_file_tree()
            .map_err(|err| BootError::BootFailure(err.to_string()))?;
        sandbox
            .mount(&files)
            .await
            .map_err(|err| BootError::BootFailure(err.to_string()))?;
        debug!(files = files.len(), "mounted seed filesystem");
        Ok(sandbox)
    }
}

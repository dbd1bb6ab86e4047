//! Cross-origin isolation gate.
//!
//! The flag is read once, at startup, and frozen into an [`IsolationState`].
//! A source that fails to read the flag yields `false`: the sandbox is denied
//! rather than booted in an unknown security context.

use std::convert::Infallible;
use std::fmt;

use tracing::{debug, warn};

/// Reads the ambient `crossOriginIsolated` flag.
pub trait IsolationSource {
    type Error: fmt::Display;

    fn cross_origin_isolated(&self) -> Result<bool, Self::Error>;
}

/// A fixed answer, for hosts that already know the flag (and for tests).
impl IsolationSource for bool {
    type Error = Infallible;

    fn cross_origin_isolated(&self) -> Result<bool, Self::Error> {
        Ok(*self)
    }
}

/// Snapshot of the isolation flag taken at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsolationState {
    isolated: bool,
}

impl IsolationState {
    #[must_use]
    pub const fn new(isolated: bool) -> Self {
        Self { isolated }
    }

    #[must_use]
    pub const fn is_isolated(self) -> bool {
        self.isolated
    }

    /// Persistent banner text when the sandbox cannot run.
    #[must_use]
    pub const fn advisory(self) -> Option<&'static str> {
        if self.isolated {
            None
        } else {
            Some(
                "This page is not cross-origin isolated, so the in-browser terminal is disabled. \
                 Commands can still be copied and run locally.",
            )
        }
    }
}

/// Captures [`IsolationState`] from a source.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolationGate;

impl IsolationGate {
    /// Query the source once. Never fails.
    pub fn capture<S: IsolationSource>(source: &S) -> IsolationState {
        match source.cross_origin_isolated() {
            Ok(isolated) => {
                debug!(isolated, "captured cross-origin isolation state");
                IsolationState::new(isolated)
            }
            Err(err) => {
                warn!(error = %err, "could not read cross-origin isolation state; treating as not isolated");
                IsolationState::new(false)
            }
        }
    }
}

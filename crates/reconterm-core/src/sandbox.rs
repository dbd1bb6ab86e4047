//! Contract with the external sandboxed execution environment.
//!
//! The engine itself lives outside this crate (in the browser it is a
//! WebContainer). Everything here is single-threaded: futures and streams are
//! `!Send` boxed values so hosts can hand over JS promises directly.

use std::fmt;
use std::future::Future;

use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;

use crate::config::FileTree;
use crate::error::SpawnError;

/// Boot primitive. Called at most once per process by [`crate::Bootstrapper`].
pub trait SandboxRuntime {
    type Sandbox: Sandbox;
    type Error: fmt::Display;

    fn boot(&self) -> impl Future<Output = Result<Self::Sandbox, Self::Error>>;
}

/// A booted sandbox.
pub trait Sandbox {
    type Error: fmt::Display;

    /// Write `files` into the sandbox filesystem.
    fn mount(&self, files: &FileTree) -> impl Future<Output = Result<(), Self::Error>>;

    /// Start `program` with `args`. No shell parsing happens on this side.
    fn spawn(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<ProcessHandle, Self::Error>>;
}

/// A running sandbox process.
///
/// `output` yields text chunks in arrival order; chunk boundaries are the
/// sandbox's, not line boundaries. `exit` resolves with the exit code.
pub struct ProcessHandle {
    pub output: LocalBoxStream<'static, Result<String, SpawnError>>,
    pub exit: LocalBoxFuture<'static, Result<i32, SpawnError>>,
}

impl ProcessHandle {
    #[must_use]
    pub fn new(
        output: LocalBoxStream<'static, Result<String, SpawnError>>,
        exit: LocalBoxFuture<'static, Result<i32, SpawnError>>,
    ) -> Self {
        Self { output, exit }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle").finish_non_exhaustive()
    }
}

/// Argument vector for running `command` through the sandbox shell.
#[must_use]
pub fn shell_args(command: &str) -> Vec<String> {
    vec!["-c".to_string(), command.to_string()]
}

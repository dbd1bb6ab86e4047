use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServeError>;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("root directory not found: {}", path.display())]
    MissingRoot { path: PathBuf },

    #[error("failed to bind {addr}: {message}")]
    Bind { addr: String, message: String },

    #[error("invalid argument: {0}")]
    Invalid(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ServeError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Invalid(_) => 2,
            Self::MissingRoot { .. } => 3,
            Self::Bind { .. } => 4,
            Self::Io(_) => 1,
        }
    }
}

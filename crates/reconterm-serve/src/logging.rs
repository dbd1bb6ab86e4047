//! Tracing subscriber setup for the serve binary.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{Result, ServeError};

/// `RUST_LOG` when set, otherwise `default_directive`.
pub fn env_filter(default_directive: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|err| ServeError::invalid(format!("log filter `{default_directive}`: {err}"))),
    }
}

/// Install the global subscriber: a compact `fmt` layer on stderr.
pub fn init(default_directive: &str) -> Result<()> {
    let filter = env_filter(default_directive)?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|err| ServeError::invalid(format!("tracing already initialized: {err}")))
}

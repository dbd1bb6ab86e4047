#![forbid(unsafe_code)]

//! Static file server for the recon terminal UI.
//!
//! The in-browser sandbox only boots on a cross-origin isolated page, so HTML
//! responses carry `Cross-Origin-Embedder-Policy: require-corp` and
//! `Cross-Origin-Opener-Policy: same-origin`. Assets and websocket upgrades
//! are served without them.

pub mod cli;
pub mod error;
pub mod logging;
pub mod server;

pub use cli::{Cli, run, run_from_env};
pub use error::{Result, ServeError};
pub use server::{ServeConfig, StaticServer};

use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::logging;
use crate::server::{ServeConfig, StaticServer};

#[derive(Debug, Parser)]
#[command(
    name = "reconterm-serve",
    about = "Serve the recon terminal UI with cross-origin isolation headers",
    version
)]
pub struct Cli {
    /// Directory containing index.html and the wasm bundle.
    #[arg(long, env = "RECONTERM_ROOT", default_value = "dist")]
    pub root: PathBuf,

    /// Listen address.
    #[arg(long, env = "RECONTERM_ADDR", default_value = "127.0.0.1:5173")]
    pub addr: String,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log: String,
}

impl Cli {
    #[must_use]
    pub fn serve_config(&self) -> ServeConfig {
        ServeConfig {
            root: self.root.clone(),
            addr: self.addr.clone(),
        }
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    logging::init(&cli.log)?;
    let server = StaticServer::bind(&cli.serve_config())?;
    server.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServeError;

    #[test]
    fn explicit_flags_win() {
        let cli = Cli::try_parse_from([
            "reconterm-serve",
            "--root",
            "site",
            "--addr",
            "0.0.0.0:8080",
            "--log",
            "debug",
        ])
        .unwrap();
        assert_eq!(
            cli.serve_config(),
            ServeConfig {
                root: PathBuf::from("site"),
                addr: "0.0.0.0:8080".into(),
            }
        );
        assert_eq!(cli.log, "debug");
    }

    #[test]
    fn missing_root_is_reported_before_binding() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "reconterm-serve",
            "--root",
            dir.path().join("absent").to_str().unwrap(),
            "--addr",
            "127.0.0.1:0",
        ])
        .unwrap();
        let err = StaticServer::bind(&cli.serve_config()).err().unwrap();
        assert!(matches!(err, ServeError::MissingRoot { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}

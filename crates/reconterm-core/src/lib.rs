#![forbid(unsafe_code)]

//! Terminal session core for the recon catalog's in-browser terminal.
//!
//! Everything in this crate is host-agnostic: the browser (or a test) supplies
//! the isolation flag, the sandbox boot primitive, and the clipboard through
//! the traits in [`sandbox`], [`isolation`], and [`clipboard`]. The crate itself
//! never blocks and never spawns threads, so it runs unchanged on
//! `wasm32-unknown-unknown`.
//!
//! Composition:
//!
//! ```text
//! IsolationGate ──▶ Bootstrapper ──(Rc)──▶ TerminalSession ◀── template::render
//!                        │                        │
//!                  SandboxRuntime            Scrollback / CommandHistory
//! ```

pub mod ansi;
pub mod bootstrap;
pub mod clipboard;
pub mod code_block;
pub mod config;
pub mod error;
pub mod headers;
pub mod history;
pub mod input;
pub mod isolation;
pub mod sandbox;
pub mod scrollback;
pub mod session;
pub mod template;

pub use bootstrap::{BootStatus, Bootstrapper};
pub use code_block::CodeBlock;
pub use config::{SeedFiles, SessionConfig};
pub use error::{BootError, ClipboardError, SpawnError, TerminalError};
pub use history::CommandHistory;
pub use isolation::{IsolationGate, IsolationSource, IsolationState};
pub use sandbox::{ProcessHandle, Sandbox, SandboxRuntime};
pub use scrollback::{LineKind, Scrollback, ScrollbackEvent, ScrollbackLine};
pub use session::{InputMode, KeyDispatch, TerminalSession};
pub use template::{Scope, render};

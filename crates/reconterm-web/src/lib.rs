#![forbid(unsafe_code)]

//! Browser frontend for the recon terminal.
//!
//! [`ReconTerminal`] is the `wasm-bindgen` export a catalog page instantiates
//! once per command block. It binds three browser facilities to the
//! host-agnostic traits of `reconterm-core`:
//!
//! - `globalThis.crossOriginIsolated` as the isolation source,
//! - `@webcontainer/api` as the sandbox runtime,
//! - `navigator.clipboard` as the clipboard writer.
//!
//! The view model handed to JS ([`snapshot`]) is plain Rust so it can be
//! tested natively.

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::ReconTerminal;

pub mod console;
pub mod snapshot;

use reconterm_core::input::{KeyInput, Modifiers};

/// Decode the compact `mods` byte the page sends with each key event.
///
/// Bit layout: 0 shift, 1 alt, 2 ctrl, 3 meta. Higher bits are ignored.
#[must_use]
pub fn key_input(key: &str, mods: u8) -> KeyInput {
    KeyInput::new(key, Modifiers::from_bits_truncate(mods))
}

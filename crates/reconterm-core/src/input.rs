//! Key handling for the terminal input line.
//!
//! The host passes the DOM `key` string plus a modifier bitset; this module
//! decides which session operation, if any, the key triggers. Unmapped keys
//! are left to the text box (typing, cursor movement, Shift+Enter newline).

use bitflags::bitflags;

bitflags! {
    /// Modifier keys held during a key event.
    ///
    /// Same bit layout the web host uses for its compact `mods: u8`.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// A key-down event from the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    /// DOM `KeyboardEvent.key`.
    pub key: String,
    pub mods: Modifiers,
}

impl KeyInput {
    #[must_use]
    pub fn new(key: impl Into<String>, mods: Modifiers) -> Self {
        Self {
            key: key.into(),
            mods,
        }
    }

    #[must_use]
    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::empty())
    }
}

/// Session operation bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    RecallPrevious,
    RecallNext,
    Interrupt,
}

impl KeyAction {
    /// Map a key to its action.
    #[must_use]
    pub fn for_key(input: &KeyInput) -> Option<Self> {
        match input.key.as_str() {
            "Enter" if !input.mods.contains(Modifiers::SHIFT) => Some(Self::Submit),
            "ArrowUp" => Some(Self::RecallPrevious),
            "ArrowDown" => Some(Self::RecallNext),
            "c" if input.mods.contains(Modifiers::CTRL) => Some(Self::Interrupt),
            _ => None,
        }
    }
}

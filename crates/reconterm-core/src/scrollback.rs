//! Scrollback log of submitted input and process output.
//!
//! Lines are immutable once pushed and carry a sequence number assigned at
//! append time. Sequence numbers keep increasing across [`Scrollback::clear`]
//! so a view that keys rows by sequence never sees a reused key.

use serde::{Deserialize, Serialize};

/// Whether a line echoes user input or carries process output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Input,
    Output,
}

/// One scrollback line (UTF-8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollbackLine {
    pub kind: LineKind,
    pub text: String,
    pub sequence: u64,
}

/// Change notification for view-layer observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScrollbackEvent {
    Appended(ScrollbackLine),
    Cleared,
}

/// Append-only line storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scrollback {
    lines: Vec<ScrollbackLine>,
    next_sequence: u64,
}

impl Scrollback {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of stored lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a line at the next sequence number.
    pub fn push(&mut self, kind: LineKind, text: impl Into<String>) -> ScrollbackEvent {
        let line = ScrollbackLine {
            kind,
            text: text.into(),
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.lines.push(line.clone());
        ScrollbackEvent::Appended(line)
    }

    /// Drop every stored line.
    pub fn clear(&mut self) -> ScrollbackEvent {
        self.lines.clear();
        ScrollbackEvent::Cleared
    }

    /// Iterate over stored lines (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &ScrollbackLine> {
        self.lines.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ScrollbackLine> {
        self.lines.last()
    }
}

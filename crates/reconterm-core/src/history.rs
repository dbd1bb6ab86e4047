//! Submitted-command history with a recall cursor.
//!
//! Entries are kept in insertion order, duplicates included, without a bound.
//! The cursor is `None` while the user is editing; recall moves it and reports
//! what the edit buffer should become.

/// Result of moving the recall cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recall<'a> {
    /// Replace the edit buffer with this entry.
    Entry(&'a str),
    /// Cursor stepped past the newest entry: empty the edit buffer.
    Fresh,
    /// Nothing to do.
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandHistory {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl CommandHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and stop recalling.
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
        self.cursor = None;
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Step toward older entries, clamping at the oldest.
    pub fn older(&mut self) -> Recall<'_> {
        let Some(last) = self.entries.len().checked_sub(1) else {
            return Recall::Unchanged;
        };
        let idx = match self.cursor {
            None => last,
            Some(idx) => idx.saturating_sub(1),
        };
        self.cursor = Some(idx);
        Recall::Entry(&self.entries[idx])
    }

    /// Step toward newer entries; past the newest the cursor clears.
    pub fn newer(&mut self) -> Recall<'_> {
        let Some(idx) = self.cursor else {
            return Recall::Unchanged;
        };
        let idx = idx + 1;
        if idx < self.entries.len() {
            self.cursor = Some(idx);
            Recall::Entry(&self.entries[idx])
        } else {
            self.cursor = None;
            Recall::Fresh
        }
    }
}

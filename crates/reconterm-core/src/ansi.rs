//! Minimal SGR handling for scrollback display.
//!
//! Only `ESC [ <params> m` sequences are recognized, and only to strip them.
//! Any other escape is passed through untouched.

use std::borrow::Cow;

const ESC: char = '\x1b';
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Remove SGR color/style sequences.
#[must_use]
pub fn strip_sgr(text: &str) -> Cow<'_, str> {
    if !text.contains(ESC) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(ESC) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match sgr_len(tail) {
            Some(len) => rest = &tail[len..],
            None => {
                out.push(ESC);
                rest = &tail[ESC.len_utf8()..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Byte length of the SGR sequence at the start of `s`, if there is one.
fn sgr_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix("\x1b[")?;
    let params = body
        .bytes()
        .take_while(|b| b.is_ascii_digit() || *b == b';')
        .count();
    (body.as_bytes().get(params) == Some(&b'm')).then_some(2 + params + 1)
}

/// Whether an output line should be styled as an error.
#[must_use]
pub fn is_error_line(text: &str) -> bool {
    text.contains("Error:")
}

/// Format a session-generated error line (red).
#[must_use]
pub fn error_line(message: impl std::fmt::Display) -> String {
    format!("{RED}Error: {message}{RESET}")
}

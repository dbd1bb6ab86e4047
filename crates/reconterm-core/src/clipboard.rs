//! Best-effort clipboard writes.

use std::future::Future;

use tracing::{debug, warn};

use crate::error::ClipboardError;

/// Host clipboard (the browser's `navigator.clipboard` in production).
pub trait ClipboardWriter {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>>;
}

/// Write `text`; failures are logged and reported as `false`.
pub async fn copy_best_effort<C: ClipboardWriter>(clipboard: &C, text: &str) -> bool {
    match clipboard.write_text(text).await {
        Ok(()) => {
            debug!(bytes = text.len(), "copied to clipboard");
            true
        }
        Err(err) => {
            warn!(error = %err, "failed to copy text");
            false
        }
    }
}

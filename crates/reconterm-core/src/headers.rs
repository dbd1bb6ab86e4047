//! Cross-origin isolation response headers.
//!
//! The browser only reports `crossOriginIsolated == true` when the HTML
//! document was served with both headers below. Any server or proxy in front
//! of the UI must reproduce them verbatim.

pub const COOP_HEADER: &str = "Cross-Origin-Opener-Policy";
pub const COOP_VALUE: &str = "same-origin";
pub const COEP_HEADER: &str = "Cross-Origin-Embedder-Policy";
pub const COEP_VALUE: &str = "require-corp";

/// Header pairs in the order they are applied.
pub const ISOLATION_HEADERS: [(&str, &str); 2] =
    [(COEP_HEADER, COEP_VALUE), (COOP_HEADER, COOP_VALUE)];

/// The request properties the header policy looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestShape<'a> {
    /// Raw `Accept` header, empty when absent.
    pub accept: &'a str,
    /// Request path, without the query string.
    pub path: &'a str,
    /// `Upgrade` or `Sec-WebSocket-Key` present.
    pub is_upgrade: bool,
}

impl RequestShape<'_> {
    /// Whether the path or `Accept` header identifies an HTML page.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.accept.contains("text/html") || self.path == "/" || self.path.ends_with(".html")
    }

    /// Isolation headers go on HTML responses only.
    ///
    /// Assets and websocket upgrades are left alone: setting COEP on an
    /// upgrade breaks live-reload sockets in most dev servers.
    #[must_use]
    pub fn wants_isolation_headers(&self) -> bool {
        self.is_html() && !self.is_upgrade
    }
}

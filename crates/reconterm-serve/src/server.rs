//! Static file server that applies the isolation header policy.

use std::fs;
use std::io::{self, Cursor};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reconterm_core::headers::{ISOLATION_HEADERS, RequestShape};
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, info, warn};

use crate::error::{Result, ServeError};

/// File served for directory paths.
pub const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub root: PathBuf,
    pub addr: String,
}

pub struct StaticServer {
    root: PathBuf,
    http: Server,
}

impl StaticServer {
    pub fn bind(config: &ServeConfig) -> Result<Self> {
        if !config.root.is_dir() {
            return Err(ServeError::MissingRoot {
                path: config.root.clone(),
            });
        }
        let http = Server::http(config.addr.as_str()).map_err(|err| ServeError::Bind {
            addr: config.addr.clone(),
            message: err.to_string(),
        })?;
        if let Some(addr) = http.server_addr().to_ip() {
            info!(root = %config.root.display(), %addr, "serving static files");
        }
        Ok(Self {
            root: config.root.clone(),
            http,
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Serve until the listener shuts down.
    pub fn run(&self) -> Result<()> {
        for request in self.http.incoming_requests() {
            self.handle(request);
        }
        Ok(())
    }

    /// Serve at most one request. Returns whether one arrived within `timeout`.
    pub fn poll(&self, timeout: Duration) -> Result<bool> {
        match self.http.recv_timeout(timeout)? {
            Some(request) => {
                self.handle(request);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn handle(&self, request: Request) {
        let url = request.url().to_string();
        let path = strip_query(&url);
        let accept = header_value(&request, "Accept").unwrap_or_default();
        let shape = RequestShape {
            accept: &accept,
            path,
            is_upgrade: header_value(&request, "Upgrade").is_some()
                || header_value(&request, "Sec-WebSocket-Key").is_some(),
        };

        let (status, mut response) = match request.method() {
            Method::Get | Method::Head => self.file_response(path),
            _ => (405, text_response(405, "method not allowed")),
        };

        let isolated = shape.wants_isolation_headers();
        if isolated {
            for (name, value) in ISOLATION_HEADERS {
                if let Some(header) = header(name, value) {
                    response.add_header(header);
                }
            }
        }

        debug!(method = %request.method(), url = %url, status, isolated, "request");
        if let Err(err) = request.respond(response) {
            warn!(url = %url, error = %err, "failed to send response");
        }
    }

    fn file_response(&self, url_path: &str) -> (u16, Response<Cursor<Vec<u8>>>) {
        let Some(path) = resolve(&self.root, url_path) else {
            return (404, text_response(404, "not found"));
        };
        match fs::read(&path) {
            Ok(bytes) => {
                let mut response = Response::from_data(bytes);
                if let Some(header) = header("Content-Type", content_type(&path)) {
                    response.add_header(header);
                }
                (200, response)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                (404, text_response(404, "not found"))
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read file");
                (500, text_response(500, "internal error"))
            }
        }
    }
}

fn text_response(status: u16, body: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_string(body).with_status_code(status)
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

fn header_value(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|header| header.field.equiv(name))
        .map(|header| header.value.as_str().to_string())
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Decode `%XX` escapes. Malformed escapes are kept literally.
fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = char::from(bytes[i + 1]).to_digit(16);
            let lo = char::from(bytes[i + 2]).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push(((hi << 4) | lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Map a URL path onto a file under `root`.
///
/// Segments are percent-decoded before the traversal check, so `%2e%2e` and
/// `%2f` cannot leave `root`. Directory paths map to their [`INDEX_FILE`].
#[must_use]
pub fn resolve(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for raw in url_path.split('/').filter(|s| !s.is_empty()) {
        let segment = percent_decode(raw);
        if segment == "."
            || segment == ".."
            || segment.contains(['/', '\\', '\0'])
        {
            return None;
        }
        path.push(segment);
    }
    if url_path.is_empty() || url_path.ends_with('/') || path.is_dir() {
        path.push(INDEX_FILE);
    }
    Some(path)
}

/// `Content-Type` by file extension.
#[must_use]
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#![forbid(unsafe_code)]

//! End-to-end header policy over a real socket.
//!
//! Run:
//!   cargo test -p reconterm-serve --test serve_contract

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;
use reconterm_serve::{ServeConfig, StaticServer};

struct Running {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    _root: tempfile::TempDir,
}

impl Drop for Running {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn start() -> Running {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("index.html"), "<!doctype html><title>recon</title>").unwrap();
    fs::create_dir(root.path().join("pkg")).unwrap();
    fs::write(root.path().join("pkg/reconterm_web_bg.wasm"), b"\0asm").unwrap();
    fs::write(root.path().join("pkg/reconterm_web.js"), "export {};").unwrap();
    fs::write(root.path().join("pkg/scan notes.txt"), "ports: 22, 443").unwrap();
    fs::create_dir(root.path().join("catalog")).unwrap();
    fs::write(root.path().join("catalog/index.html"), "<p>catalog</p>").unwrap();

    let server = StaticServer::bind(&ServeConfig {
        root: root.path().to_path_buf(),
        addr: "127.0.0.1:0".into(),
    })
    .unwrap();
    let addr = server.local_addr().unwrap();
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let handle = thread::spawn(move || {
        while !stop_flag.load(Ordering::SeqCst) {
            if server.poll(Duration::from_millis(50)).is_err() {
                break;
            }
        }
    });
    Running {
        addr,
        stop,
        handle: Some(handle),
        _root: root,
    }
}

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn isolated(&self) -> bool {
        self.header("Cross-Origin-Embedder-Policy") == Some("require-corp")
            && self.header("Cross-Origin-Opener-Policy") == Some("same-origin")
    }
}

fn request(addr: SocketAddr, method: &str, path: &str, extra: &[(&str, &str)]) -> Reply {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut head = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in extra {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");
    stream.write_all(head.as_bytes()).unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).unwrap();
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has a header terminator");
    let head = String::from_utf8_lossy(&raw[..split]).into_owned();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("status line");
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    Reply {
        status,
        headers,
        body,
    }
}

#[test]
fn root_document_is_isolated() {
    let server = start();
    let reply = request(server.addr, "GET", "/", &[]);
    assert_eq!(reply.status, 200);
    assert!(reply.isolated());
    assert_eq!(reply.header("Content-Type"), Some("text/html; charset=utf-8"));
    assert_eq!(reply.body, b"<!doctype html><title>recon</title>".to_vec());
}

#[test]
fn navigation_by_accept_header_is_isolated() {
    let server = start();
    let reply = request(
        server.addr,
        "GET",
        "/catalog/",
        &[("Accept", "text/html,application/xhtml+xml")],
    );
    assert_eq!(reply.status, 200);
    assert!(reply.isolated());
    assert_eq!(reply.body, b"<p>catalog</p>".to_vec());
}

#[test]
fn assets_are_served_without_isolation_headers() {
    let server = start();
    let reply = request(server.addr, "GET", "/pkg/reconterm_web_bg.wasm", &[("Accept", "*/*")]);
    assert_eq!(reply.status, 200);
    assert!(!reply.isolated());
    assert_eq!(reply.header("Content-Type"), Some("application/wasm"));

    let reply = request(server.addr, "GET", "/pkg/reconterm_web.js?v=2", &[]);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("Cross-Origin-Embedder-Policy"), None);
}

#[test]
fn upgrade_requests_never_get_headers() {
    let server = start();
    let reply = request(
        server.addr,
        "GET",
        "/index.html",
        &[("Accept", "text/html"), ("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ==")],
    );
    assert!(!reply.isolated());
}

#[test]
fn missing_and_escaping_paths_are_not_found() {
    let server = start();
    assert_eq!(request(server.addr, "GET", "/nope.js", &[]).status, 404);
    assert_eq!(request(server.addr, "GET", "/../secret", &[]).status, 404);
}

#[test]
fn escaped_paths_are_decoded_before_lookup() {
    let server = start();
    let reply = request(server.addr, "GET", "/pkg/scan%20notes.txt", &[]);
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body, b"ports: 22, 443".to_vec());

    assert_eq!(request(server.addr, "GET", "/pkg/%2e%2e/%2e%2e/secret", &[]).status, 404);
}

#[test]
fn unsupported_methods_are_rejected() {
    let server = start();
    let reply = request(server.addr, "DELETE", "/pkg/reconterm_web.js", &[]);
    assert_eq!(reply.status, 405);
}

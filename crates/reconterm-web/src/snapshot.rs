//! JSON view model handed to the page.
//!
//! The page renders from a [`ViewSnapshot`] and applies incremental
//! [`ViewEvent`]s pushed by the session observer. Line text is stripped of SGR
//! sequences here; error lines carry `is_error` so the page can color them.

use serde::Serialize;

use reconterm_core::ansi::{is_error_line, strip_sgr};
use reconterm_core::{
    BootStatus, InputMode, LineKind, SandboxRuntime, ScrollbackEvent, ScrollbackLine,
    TerminalSession,
};

/// One rendered scrollback row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewLine {
    pub sequence: u64,
    pub kind: LineKind,
    pub text: String,
    pub is_error: bool,
}

impl From<&ScrollbackLine> for ViewLine {
    fn from(line: &ScrollbackLine) -> Self {
        let is_error = line.kind == LineKind::Output && is_error_line(&line.text);
        Self {
            sequence: line.sequence,
            kind: line.kind,
            text: strip_sgr(&line.text).into_owned(),
            is_error,
        }
    }
}

/// Incremental update for the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    Appended { line: ViewLine },
    Cleared,
}

impl From<&ScrollbackEvent> for ViewEvent {
    fn from(event: &ScrollbackEvent) -> Self {
        match event {
            ScrollbackEvent::Appended(line) => Self::Appended { line: line.into() },
            ScrollbackEvent::Cleared => Self::Cleared,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootView {
    pub status: &'static str,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<BootStatus> for BootView {
    fn from(status: BootStatus) -> Self {
        let (error_kind, error) = match &status {
            BootStatus::Failed(err) => (Some(err.kind()), Some(err.to_string())),
            _ => (None, None),
        };
        Self {
            status: status.as_str(),
            loading: !status.is_terminal(),
            error_kind,
            error,
        }
    }
}

/// Full view state of one terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    pub lines: Vec<ViewLine>,
    pub input: String,
    pub recalling: bool,
    pub history_cursor: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome: Option<[String; 2]>,
    pub boot: BootView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<&'static str>,
}

impl ViewSnapshot {
    #[must_use]
    pub fn capture<R: SandboxRuntime>(session: &TerminalSession<R>, login_time: &str) -> Self {
        let env = session.environment();
        Self {
            lines: session.lines().iter().map(ViewLine::from).collect(),
            input: session.edit_buffer(),
            recalling: session.input_mode() == InputMode::Recalling,
            history_cursor: session.history_cursor(),
            welcome: session.welcome(login_time),
            boot: env.status().into(),
            advisory: env.isolation().advisory(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Serialize a scrollback event for a JS observer.
pub fn event_json(event: &ScrollbackEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ViewEvent::from(event))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::{FutureExt, StreamExt, stream};
    use pretty_assertions::assert_eq;
    use reconterm_core::config::FileTree;
    use reconterm_core::error::SpawnError;
    use reconterm_core::{Bootstrapper, IsolationState, ProcessHandle, Sandbox};

    use super::*;

    struct ChunkSandbox(Vec<&'static str>);

    impl Sandbox for ChunkSandbox {
        type Error = &'static str;

        async fn mount(&self, _files: &FileTree) -> Result<(), &'static str> {
            Ok(())
        }

        async fn spawn(&self, _program: &str, _args: &[String]) -> Result<ProcessHandle, &'static str> {
            let chunks: Vec<Result<String, SpawnError>> =
                self.0.iter().map(|c| Ok((*c).to_string())).collect();
            Ok(ProcessHandle::new(
                stream::iter(chunks).boxed_local(),
                async { Ok::<i32, SpawnError>(0) }.boxed_local(),
            ))
        }
    }

    struct ChunkRuntime(Vec<&'static str>);

    impl SandboxRuntime for ChunkRuntime {
        type Sandbox = ChunkSandbox;
        type Error = &'static str;

        async fn boot(&self) -> Result<ChunkSandbox, &'static str> {
            Ok(ChunkSandbox(self.0.clone()))
        }
    }

    fn session(isolated: bool, chunks: Vec<&'static str>) -> TerminalSession<ChunkRuntime> {
        let env = Rc::new(Bootstrapper::new(
            ChunkRuntime(chunks),
            IsolationState::new(isolated),
        ));
        TerminalSession::new(env, "whois acme.io")
    }

    #[test]
    fn fresh_terminal_shows_welcome_and_seed() {
        let session = session(true, Vec::new());
        let snap = ViewSnapshot::capture(&session, "Mon Oct 19 09:00:00");

        assert!(snap.lines.is_empty());
        assert_eq!(snap.input, "whois acme.io");
        assert_eq!(
            snap.welcome,
            Some([
                "Last login: Mon Oct 19 09:00:00 on ttys001".to_string(),
                "Type a command to start reconnaissance...".to_string(),
            ])
        );
        assert_eq!(snap.boot.status, "absent");
        assert!(snap.boot.loading);
        assert_eq!(snap.advisory, None);
    }

    #[test]
    fn output_is_stripped_and_welcome_hidden() {
        let session = session(true, vec!["\x1b[32mfound\x1b[0m 3 hosts"]);
        pollster::block_on(session.environment().ensure_booted());
        pollster::block_on(session.submit("subfinder -d acme.io"));

        let snap = ViewSnapshot::capture(&session, "now");
        assert_eq!(snap.welcome, None);
        assert_eq!(
            snap.lines,
            vec![
                ViewLine {
                    sequence: 0,
                    kind: LineKind::Input,
                    text: "subfinder -d acme.io".into(),
                    is_error: false,
                },
                ViewLine {
                    sequence: 1,
                    kind: LineKind::Output,
                    text: "found 3 hosts".into(),
                    is_error: false,
                },
            ]
        );
        assert_eq!(snap.boot.status, "ready");
        assert!(!snap.boot.loading);
    }

    #[test]
    fn isolation_failure_surfaces_in_banner_and_lines() {
        let session = session(false, Vec::new());
        pollster::block_on(session.environment().ensure_booted());
        pollster::block_on(session.submit("ls"));

        let snap = ViewSnapshot::capture(&session, "now");
        assert_eq!(snap.boot.status, "failed");
        assert_eq!(snap.boot.error_kind, Some("isolation_required"));
        assert!(snap.advisory.is_some());
        let last = snap.lines.last().map(|l| (l.is_error, l.text.starts_with("Error: ")));
        assert_eq!(last, Some((true, true)));
    }

    #[test]
    fn input_lines_are_never_error_styled() {
        let line = ScrollbackLine {
            kind: LineKind::Input,
            text: "grep Error: log.txt".into(),
            sequence: 4,
        };
        assert!(!ViewLine::from(&line).is_error);
    }

    #[test]
    fn event_json_shape() {
        let appended = ScrollbackEvent::Appended(ScrollbackLine {
            kind: LineKind::Output,
            text: "\x1b[31mError: boom\x1b[0m".into(),
            sequence: 7,
        });
        let value: serde_json::Value =
            serde_json::from_str(&event_json(&appended).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "appended",
                "line": {"sequence": 7, "kind": "output", "text": "Error: boom", "is_error": true}
            })
        );

        let cleared = event_json(&ScrollbackEvent::Cleared).unwrap();
        assert_eq!(cleared, r#"{"type":"cleared"}"#);
    }

    #[test]
    fn snapshot_json_omits_empty_options() {
        let session = session(true, Vec::new());
        pollster::block_on(session.submit("clear"));
        let json = ViewSnapshot::capture(&session, "now").to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("advisory").is_none());
        assert!(value["boot"].get("error").is_none());
        assert_eq!(value["lines"], serde_json::json!([]));
        assert_eq!(value["history_cursor"], serde_json::Value::Null);
    }
}

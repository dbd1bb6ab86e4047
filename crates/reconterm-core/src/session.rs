//! Terminal session: edit buffer, command history, and scrollback.
//!
//! # Invariants
//!
//! 1. **One edit buffer**: replaced wholesale by history recall.
//! 2. **Append order**: scrollback lines are appended in call order. Output
//!    chunks of one process keep their arrival order; output of two commands
//!    in flight at once may interleave.
//! 3. **Local `clear`**: the `clear` directive wipes scrollback and is never
//!    sent to the sandbox.
//! 4. **No escalation**: every failure becomes a scrollback line.
//!
//! All methods take `&self`. State sits behind a `RefCell` that is never
//! borrowed across an `.await`, so keystrokes and output chunks can be
//! handled while a submission is suspended on its process.

use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;
use tracing::{debug, warn};

use crate::ansi::error_line;
use crate::bootstrap::Bootstrapper;
use crate::config::SessionConfig;
use crate::error::{SpawnError, TerminalError};
use crate::history::{CommandHistory, Recall};
use crate::input::{KeyAction, KeyInput};
use crate::sandbox::{ProcessHandle, Sandbox, SandboxRuntime, shell_args};
use crate::scrollback::{LineKind, Scrollback, ScrollbackEvent, ScrollbackLine};

/// Client-side directive that wipes the scrollback.
pub const CLEAR_DIRECTIVE: &str = "clear";
/// Suffix appended to an interrupted input line.
pub const INTERRUPT_MARKER: &str = "^C";

/// Whether history recall is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Editing,
    Recalling,
}

/// What the host should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDispatch {
    /// Not ours; let the text box handle it.
    Ignored,
    /// Handled synchronously; suppress the default action.
    Handled,
    /// Suppress the default action and run [`TerminalSession::submit`] with this text.
    Submit(String),
}

impl KeyDispatch {
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

type Observer = Box<dyn Fn(&ScrollbackEvent)>;

#[derive(Debug, Default)]
struct SessionState {
    scrollback: Scrollback,
    history: CommandHistory,
    edit: String,
}

/// One terminal attached to a catalog command.
pub struct TerminalSession<R: SandboxRuntime> {
    env: Rc<Bootstrapper<R>>,
    config: SessionConfig,
    state: RefCell<SessionState>,
    observers: RefCell<Vec<Observer>>,
}

impl<R: SandboxRuntime> TerminalSession<R> {
    /// Create a session whose edit buffer starts as `seed`.
    ///
    /// A non-blank seed is also the first history entry, so it stays
    /// recallable after the user edits it away.
    #[must_use]
    pub fn new(env: Rc<Bootstrapper<R>>, seed: impl Into<String>) -> Self {
        Self::with_config(env, seed, SessionConfig::default())
    }

    #[must_use]
    pub fn with_config(
        env: Rc<Bootstrapper<R>>,
        seed: impl Into<String>,
        config: SessionConfig,
    ) -> Self {
        let seed = seed.into();
        let mut history = CommandHistory::new();
        if !seed.trim().is_empty() {
            history.push(seed.clone());
        }
        Self {
            env,
            config,
            state: RefCell::new(SessionState {
                scrollback: Scrollback::new(),
                history,
                edit: seed,
            }),
            observers: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn environment(&self) -> &Rc<Bootstrapper<R>> {
        &self.env
    }

    /// Register a view-layer observer for scrollback changes.
    ///
    /// Observers run after the state borrow is released and may read the
    /// session, but must not register further observers from the callback.
    pub fn subscribe(&self, observer: impl Fn(&ScrollbackEvent) + 'static) {
        self.observers.borrow_mut().push(Box::new(observer));
    }

    fn notify(&self, events: &[ScrollbackEvent]) {
        let observers = self.observers.borrow();
        for event in events {
            for observer in observers.iter() {
                observer(event);
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    #[must_use]
    pub fn edit_buffer(&self) -> String {
        self.state.borrow().edit.clone()
    }

    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        if self.state.borrow().history.cursor().is_some() {
            InputMode::Recalling
        } else {
            InputMode::Editing
        }
    }

    #[must_use]
    pub fn history_cursor(&self) -> Option<usize> {
        self.state.borrow().history.cursor()
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.iter().map(str::to_owned).collect()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<ScrollbackLine> {
        self.state.borrow().scrollback.iter().cloned().collect()
    }

    #[must_use]
    pub fn scrollback_len(&self) -> usize {
        self.state.borrow().scrollback.len()
    }

    /// Welcome banner lines, shown only while the scrollback is empty.
    #[must_use]
    pub fn welcome(&self, login_time: &str) -> Option<[String; 2]> {
        self.state
            .borrow()
            .scrollback
            .is_empty()
            .then(|| self.config.welcome_lines(login_time))
    }

    // ── Editing ──────────────────────────────────────────────────────────

    /// Replace the edit buffer with what the user typed.
    pub fn set_input(&self, text: impl Into<String>) {
        self.state.borrow_mut().edit = text.into();
    }

    /// Offer a newly rendered seed command after a scope change.
    ///
    /// Applied only while the scrollback is empty; returns whether it was.
    pub fn reseed(&self, command: impl Into<String>) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.scrollback.is_empty() {
            return false;
        }
        state.edit = command.into();
        true
    }

    pub fn recall_previous(&self) {
        let mut state = self.state.borrow_mut();
        let SessionState { history, edit, .. } = &mut *state;
        apply_recall(edit, history.older());
    }

    pub fn recall_next(&self) {
        let mut state = self.state.borrow_mut();
        let SessionState { history, edit, .. } = &mut *state;
        apply_recall(edit, history.newer());
    }

    /// Cancel the current command line without submitting it.
    pub fn interrupt(&self) {
        let event = {
            let mut state = self.state.borrow_mut();
            let text = format!("{}{INTERRUPT_MARKER}", state.edit);
            state.edit.clear();
            state.scrollback.push(LineKind::Input, text)
        };
        self.notify(&[event]);
    }

    /// Route a key press to the matching operation.
    pub fn handle_key(&self, input: &KeyInput) -> KeyDispatch {
        match KeyAction::for_key(input) {
            None => KeyDispatch::Ignored,
            Some(KeyAction::Submit) => KeyDispatch::Submit(self.edit_buffer()),
            Some(KeyAction::RecallPrevious) => {
                self.recall_previous();
                KeyDispatch::Handled
            }
            Some(KeyAction::RecallNext) => {
                self.recall_next();
                KeyDispatch::Handled
            }
            Some(KeyAction::Interrupt) => {
                self.interrupt();
                KeyDispatch::Handled
            }
        }
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Submit a command line.
    ///
    /// Blank input only resets the edit buffer. Otherwise the raw text is
    /// echoed, the trimmed text is recorded in history, and the command runs
    /// in the sandbox unless it is the local `clear` directive. Resolves when
    /// the process has exited.
    pub async fn submit(&self, raw: &str) {
        let command = raw.trim();
        let events = {
            let mut state = self.state.borrow_mut();
            state.edit.clear();
            if command.is_empty() {
                state.history.reset_cursor();
                return;
            }
            let mut events = vec![state.scrollback.push(LineKind::Input, raw)];
            state.history.push(command);
            if command == CLEAR_DIRECTIVE {
                events.push(state.scrollback.clear());
            }
            events
        };
        self.notify(&events);

        if command == CLEAR_DIRECTIVE {
            return;
        }
        if let Err(err) = self.execute(command).await {
            warn!(command, error = %err, "command failed");
            self.push_output(error_line(&err));
        }
    }

    async fn execute(&self, command: &str) -> Result<(), TerminalError> {
        let sandbox = self.env.handle()?;
        debug!(command, shell = %self.config.shell, "spawning command");
        let process = sandbox
            .spawn(&self.config.shell, &shell_args(command))
            .await
            .map_err(|err| SpawnError::Spawn(err.to_string()))?;
        let code = self.drain(process).await?;
        debug!(command, code, "command exited");
        Ok(())
    }

    /// Pump output chunks into scrollback while awaiting the exit signal.
    async fn drain(&self, process: ProcessHandle) -> Result<i32, SpawnError> {
        let ProcessHandle { mut output, exit } = process;
        let pump = async {
            while let Some(chunk) = output.next().await {
                match chunk {
                    Ok(text) => self.push_output(text),
                    Err(err) => return Err(err),
                }
            }
            Ok(())
        };
        let (pumped, code) = futures::join!(pump, exit);
        pumped?;
        code
    }

    fn push_output(&self, text: String) {
        let event = self
            .state
            .borrow_mut()
            .scrollback
            .push(LineKind::Output, text);
        self.notify(&[event]);
    }
}

fn apply_recall(edit: &mut String, recall: Recall<'_>) {
    match recall {
        Recall::Entry(entry) => *edit = entry.to_owned(),
        Recall::Fresh => edit.clear(),
        Recall::Unchanged => {}
    }
}

//! Scripted sandbox used by the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::{mpsc, oneshot};
use futures::{FutureExt, StreamExt, stream};
use reconterm_core::config::FileTree;
use reconterm_core::error::SpawnError;
use reconterm_core::sandbox::{ProcessHandle, Sandbox, SandboxRuntime};
use reconterm_core::{Bootstrapper, IsolationState};

/// How the next spawned process behaves.
pub enum Script {
    /// Emit these chunks, then exit 0.
    Chunks(Vec<String>),
    /// Hand the test a live channel pair to drive by hand.
    Live(Rc<RefCell<Option<LiveProcess>>>),
    /// Reject the spawn call.
    Reject(String),
}

/// Test-side ends of a [`Script::Live`] process.
pub struct LiveProcess {
    pub output: mpsc::UnboundedSender<Result<String, SpawnError>>,
    pub exit: oneshot::Sender<Result<i32, SpawnError>>,
}

#[derive(Default)]
pub struct Log {
    pub boots: Cell<usize>,
    pub mounts: RefCell<Vec<FileTree>>,
    pub spawns: RefCell<Vec<(String, Vec<String>)>>,
}

pub struct FakeSandbox {
    log: Rc<Log>,
    scripts: Rc<RefCell<VecDeque<Script>>>,
    mount_error: Option<String>,
}

impl Sandbox for FakeSandbox {
    type Error = String;

    async fn mount(&self, files: &FileTree) -> Result<(), String> {
        self.log.mounts.borrow_mut().push(files.clone());
        match &self.mount_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn spawn(&self, program: &str, args: &[String]) -> Result<ProcessHandle, String> {
        self.log
            .spawns
            .borrow_mut()
            .push((program.to_string(), args.to_vec()));
        let script = self
            .scripts
            .borrow_mut()
            .pop_front()
            .unwrap_or(Script::Chunks(Vec::new()));
        match script {
            Script::Chunks(chunks) => Ok(ProcessHandle::new(
                stream::iter(chunks.into_iter().map(Ok::<String, SpawnError>)).boxed_local(),
                async { Ok::<i32, SpawnError>(0) }.boxed_local(),
            )),
            Script::Live(slot) => {
                let (out_tx, out_rx) = mpsc::unbounded();
                let (exit_tx, exit_rx) = oneshot::channel();
                *slot.borrow_mut() = Some(LiveProcess {
                    output: out_tx,
                    exit: exit_tx,
                });
                Ok(ProcessHandle::new(
                    out_rx.boxed_local(),
                    async move {
                        exit_rx
                            .await
                            .unwrap_or_else(|_| Err(SpawnError::Exit("dropped".into())))
                    }
                    .boxed_local(),
                ))
            }
            Script::Reject(err) => Err(err),
        }
    }
}

pub struct FakeRuntime {
    pub log: Rc<Log>,
    pub scripts: Rc<RefCell<VecDeque<Script>>>,
    pub boot_error: Option<String>,
    pub mount_error: Option<String>,
    /// When set, `boot` suspends until the sender fires or drops.
    pub boot_gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            log: Rc::new(Log::default()),
            scripts: Rc::new(RefCell::new(VecDeque::new())),
            boot_error: None,
            mount_error: None,
            boot_gate: RefCell::new(None),
        }
    }

    /// A runtime whose boot call stays pending until the returned sender fires.
    pub fn gated() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let runtime = Self::new();
        *runtime.boot_gate.borrow_mut() = Some(rx);
        (runtime, tx)
    }

    pub fn failing(message: &str) -> Self {
        Self {
            boot_error: Some(message.to_string()),
            ..Self::new()
        }
    }
}

impl SandboxRuntime for FakeRuntime {
    type Sandbox = FakeSandbox;
    type Error = String;

    async fn boot(&self) -> Result<FakeSandbox, String> {
        self.log.boots.set(self.log.boots.get() + 1);
        let gate = self.boot_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if let Some(err) = &self.boot_error {
            return Err(err.clone());
        }
        Ok(FakeSandbox {
            log: Rc::clone(&self.log),
            scripts: Rc::clone(&self.scripts),
            mount_error: self.mount_error.clone(),
        })
    }
}

pub struct Fixture {
    pub log: Rc<Log>,
    pub scripts: Rc<RefCell<VecDeque<Script>>>,
    pub env: Rc<Bootstrapper<FakeRuntime>>,
}

impl Fixture {
    pub fn push_script(&self, script: Script) {
        self.scripts.borrow_mut().push_back(script);
    }
}

/// A bootstrapper over a fresh fake runtime, not yet booted.
pub fn fixture(runtime: FakeRuntime, isolated: bool) -> Fixture {
    let log = Rc::clone(&runtime.log);
    let scripts = Rc::clone(&runtime.scripts);
    let env = Rc::new(Bootstrapper::new(runtime, IsolationState::new(isolated)));
    Fixture { log, scripts, env }
}

/// A bootstrapper that has already reached `Ready`.
pub fn ready_fixture() -> Fixture {
    let fx = fixture(FakeRuntime::new(), true);
    pollster::block_on(fx.env.ensure_booted());
    fx
}

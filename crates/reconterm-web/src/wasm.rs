#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the recon terminal.
//!
//! Only compiled on `wasm32` targets.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Once;

use futures::future::LocalBoxFuture;
use futures::stream::LocalBoxStream;
use futures::{FutureExt, StreamExt};
use js_sys::{Array, Object, Promise, Reflect};
use tracing::{Level, debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise, spawn_local};
use web_sys::{ReadableStream, ReadableStreamDefaultReader};

use reconterm_core::clipboard::ClipboardWriter;
use reconterm_core::config::FileTree;
use reconterm_core::error::{ClipboardError, SpawnError};
use reconterm_core::{
    Bootstrapper, CodeBlock, IsolationGate, IsolationSource, KeyDispatch, ProcessHandle, Sandbox,
    SandboxRuntime, Scope, TerminalSession,
};

use crate::console::{ConsoleLayer, console_method};
use crate::key_input;
use crate::snapshot::{ViewSnapshot, event_json};

/// A rejected JS promise or thrown value, flattened to text.
#[derive(Debug, Clone)]
struct JsError(String);

impl From<JsValue> for JsError {
    fn from(value: JsValue) -> Self {
        Self(describe(&value))
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn describe(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn get(target: &JsValue, key: &str) -> Result<JsValue, JsError> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(JsError::from)
}

fn call(target: &JsValue, method: &str, args: &Array) -> Result<JsValue, JsError> {
    let function = get(target, method)?
        .dyn_into::<js_sys::Function>()
        .map_err(|_| JsError(format!("`{method}` is not a function")))?;
    Ok(Reflect::apply(&function, target, args)?)
}

async fn settle(value: JsValue) -> Result<JsValue, JsError> {
    Ok(JsFuture::from(Promise::resolve(&value)).await?)
}

/// Write `msg` through `console.<method>`, falling back to `console.log`.
fn console(method: &str, msg: &str) {
    let Ok(console) = get(&js_sys::global(), "console") else {
        return;
    };
    let args = Array::of1(&JsValue::from_str(msg));
    if call(&console, method, &args).is_err() {
        let _ = call(&console, "log", &args);
    }
}

fn console_sink(level: Level, line: &str) {
    console(console_method(level), line);
}

/// Route panics and `tracing` events (info and above) to the console, once per page.
fn install_browser_logging() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            console("error", &format!("reconterm {info}"));
        }));
        let subscriber =
            tracing_subscriber::registry().with(ConsoleLayer::new(Level::INFO, console_sink));
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            console("debug", "reconterm: keeping the existing tracing subscriber");
        }
    });
}

// ---------------------------------------------------------------------------
// @webcontainer/api
// ---------------------------------------------------------------------------

/// Boots the page's single WebContainer through the class the page imported.
struct WebContainerRuntime {
    class: JsValue,
}

impl SandboxRuntime for WebContainerRuntime {
    type Sandbox = WebContainer;
    type Error = JsError;

    async fn boot(&self) -> Result<WebContainer, JsError> {
        let inner = settle(call(&self.class, "boot", &Array::new())?).await?;
        Ok(WebContainer { inner })
    }
}

struct WebContainer {
    inner: JsValue,
}

impl Sandbox for WebContainer {
    type Error = JsError;

    async fn mount(&self, files: &FileTree) -> Result<(), JsError> {
        let tree = file_tree_to_js(files)?;
        settle(call(&self.inner, "mount", &Array::of1(&tree))?).await?;
        Ok(())
    }

    async fn spawn(&self, program: &str, args: &[String]) -> Result<ProcessHandle, JsError> {
        let argv: Array = args.iter().map(|arg| JsValue::from_str(arg)).collect();
        let call_args = Array::of2(&JsValue::from_str(program), &argv);
        let process = settle(call(&self.inner, "spawn", &call_args)?).await?;
        let output: ReadableStream = get(&process, "output")?.unchecked_into();
        let exit = Promise::resolve(&get(&process, "exit")?);
        Ok(ProcessHandle::new(output_stream(output), exit_future(exit)))
    }
}

/// `{ "README.md": { file: { contents } }, ... }`
fn file_tree_to_js(files: &FileTree) -> Result<Object, JsError> {
    let tree = Object::new();
    for (path, contents) in files {
        let file = Object::new();
        Reflect::set(&file, &"contents".into(), &JsValue::from_str(contents))?;
        let node = Object::new();
        Reflect::set(&node, &"file".into(), &file)?;
        Reflect::set(&tree, &JsValue::from_str(path), &node)?;
    }
    Ok(tree)
}

fn output_stream(stream: ReadableStream) -> LocalBoxStream<'static, Result<String, SpawnError>> {
    let reader: ReadableStreamDefaultReader = stream.get_reader().unchecked_into();
    futures::stream::unfold(Some(reader), |reader| async move {
        let reader = reader?;
        match read_chunk(&reader).await {
            Ok(Some(chunk)) => Some((Ok(chunk), Some(reader))),
            Ok(None) => None,
            Err(err) => Some((Err(SpawnError::Stream(err.to_string())), None)),
        }
    })
    .boxed_local()
}

async fn read_chunk(reader: &ReadableStreamDefaultReader) -> Result<Option<String>, JsError> {
    let result = JsFuture::from(reader.read()).await?;
    if get(&result, "done")?.as_bool().unwrap_or(true) {
        return Ok(None);
    }
    let value = get(&result, "value")?;
    Ok(Some(value.as_string().unwrap_or_default()))
}

fn exit_future(exit: Promise) -> LocalBoxFuture<'static, Result<i32, SpawnError>> {
    async move {
        let code = JsFuture::from(exit)
            .await
            .map_err(|err| SpawnError::Exit(describe(&err)))?;
        code.as_f64()
            .map(|c| c as i32)
            .ok_or_else(|| SpawnError::Exit(format!("non-numeric exit code {code:?}")))
    }
    .boxed_local()
}

// ---------------------------------------------------------------------------
// Browser facilities
// ---------------------------------------------------------------------------

struct GlobalIsolation;

impl IsolationSource for GlobalIsolation {
    type Error = JsError;

    fn cross_origin_isolated(&self) -> Result<bool, JsError> {
        Ok(get(&js_sys::global(), "crossOriginIsolated")?
            .as_bool()
            .unwrap_or(false))
    }
}

struct NavigatorClipboard;

impl NavigatorClipboard {
    fn write_text_fn() -> Result<(JsValue, js_sys::Function), ClipboardError> {
        let unavailable = |_| ClipboardError::Unavailable;
        let navigator = get(&js_sys::global(), "navigator").map_err(unavailable)?;
        let clipboard = get(&navigator, "clipboard").map_err(unavailable)?;
        let write = get(&clipboard, "writeText")
            .map_err(unavailable)?
            .dyn_into::<js_sys::Function>()
            .map_err(|_| ClipboardError::Unavailable)?;
        Ok((clipboard, write))
    }
}

impl ClipboardWriter for NavigatorClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let (clipboard, write) = Self::write_text_fn()?;
        let promise = write
            .call1(&clipboard, &JsValue::from_str(text))
            .map_err(|err| ClipboardError::Rejected(describe(&err)))?;
        JsFuture::from(Promise::resolve(&promise))
            .await
            .map_err(|err| ClipboardError::Rejected(describe(&err)))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared environment
// ---------------------------------------------------------------------------

type Environment = Rc<Bootstrapper<WebContainerRuntime>>;

thread_local! {
    static ENVIRONMENT: OnceCell<Environment> = const { OnceCell::new() };
}

/// The page-wide bootstrapper; the first call creates it and starts the boot.
///
/// Later calls ignore `class` and share the existing environment.
fn environment(class: &JsValue) -> Environment {
    ENVIRONMENT.with(|cell| {
        Rc::clone(cell.get_or_init(|| {
            let isolation = IsolationGate::capture(&GlobalIsolation);
            let runtime = WebContainerRuntime {
                class: class.clone(),
            };
            let env = Rc::new(Bootstrapper::new(runtime, isolation));
            let booting = Rc::clone(&env);
            spawn_local(async move {
                booting.ensure_booted().await;
            });
            env
        }))
    })
}

// ---------------------------------------------------------------------------
// ReconTerminal
// ---------------------------------------------------------------------------

/// One catalog command block with its terminal.
#[wasm_bindgen]
pub struct ReconTerminal {
    session: Rc<TerminalSession<WebContainerRuntime>>,
    block: Rc<CodeBlock>,
}

#[wasm_bindgen]
impl ReconTerminal {
    /// Create a terminal seeded with `template` rendered against the scope.
    ///
    /// `web_container` is the `WebContainer` class exported by
    /// `@webcontainer/api`. Only the first terminal's class is used; all
    /// terminals on the page share one sandbox.
    #[wasm_bindgen(constructor)]
    pub fn new(
        web_container: JsValue,
        template: &str,
        target: &str,
        asn: &str,
        org: &str,
    ) -> Self {
        install_browser_logging();
        let block = Rc::new(CodeBlock::new(template, Scope::new(target, asn, org)));
        let env = environment(&web_container);
        let session = Rc::new(TerminalSession::new(env, block.rendered()));
        debug!(template, "terminal created");
        Self { session, block }
    }

    /// Handle a key-down. Returns `true` when the page must `preventDefault()`.
    #[wasm_bindgen(js_name = keyDown)]
    pub fn key_down(&self, key: &str, mods: u8) -> bool {
        match self.session.handle_key(&key_input(key, mods)) {
            KeyDispatch::Submit(text) => {
                let session = Rc::clone(&self.session);
                spawn_local(async move { session.submit(&text).await });
                true
            }
            other => other.is_consumed(),
        }
    }

    /// Mirror the text box contents.
    #[wasm_bindgen(js_name = setInput)]
    pub fn set_input(&self, text: String) {
        self.session.set_input(text);
    }

    /// Submit `text`; the promise resolves once the command has exited.
    pub fn submit(&self, text: String) -> Promise {
        let session = Rc::clone(&self.session);
        future_to_promise(async move {
            session.submit(&text).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Re-render for a new scope. Returns whether the input line was updated.
    #[wasm_bindgen(js_name = setScope)]
    pub fn set_scope(&self, target: &str, asn: &str, org: &str) -> bool {
        let rendered = self.block.set_scope(Scope::new(target, asn, org));
        self.session.reseed(rendered)
    }

    /// Register `callback(eventJson)` for scrollback changes.
    pub fn subscribe(&self, callback: js_sys::Function) {
        self.session.subscribe(move |event| match event_json(event) {
            Ok(json) => {
                if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                    warn!(error = %describe(&err), "scrollback observer threw");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode scrollback event"),
        });
    }

    /// JSON view snapshot. `login_time` is formatted by the page.
    pub fn snapshot(&self, login_time: &str) -> Result<String, JsValue> {
        ViewSnapshot::capture(&self.session, login_time)
            .to_json()
            .map_err(|err| JsValue::from_str(&err.to_string()))
    }

    /// Rendered command, as shown in the code block.
    #[wasm_bindgen(getter)]
    pub fn rendered(&self) -> String {
        self.block.rendered()
    }

    #[wasm_bindgen(getter)]
    pub fn raw(&self) -> String {
        self.block.raw().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn copied(&self) -> bool {
        self.block.is_copied()
    }

    /// "Copy Template". Resolves to whether the write succeeded.
    #[wasm_bindgen(js_name = copyTemplate)]
    pub fn copy_template(&self) -> Promise {
        let block = Rc::clone(&self.block);
        future_to_promise(async move {
            Ok(JsValue::from_bool(
                block.copy_rendered(&NavigatorClipboard).await,
            ))
        })
    }

    /// "Copy Raw".
    #[wasm_bindgen(js_name = copyRaw)]
    pub fn copy_raw(&self) -> Promise {
        let block = Rc::clone(&self.block);
        future_to_promise(async move {
            Ok(JsValue::from_bool(block.copy_raw(&NavigatorClipboard).await))
        })
    }

    /// Called by the page after `copiedFeedbackMs`.
    #[wasm_bindgen(js_name = resetCopied)]
    pub fn reset_copied(&self) {
        self.block.reset_copied();
    }

    #[wasm_bindgen(js_name = copiedFeedbackMs)]
    pub fn copied_feedback_ms() -> u32 {
        reconterm_core::code_block::COPIED_FEEDBACK_MS
    }

    /// Whether the page is cross-origin isolated.
    #[wasm_bindgen(getter)]
    pub fn isolated(&self) -> bool {
        self.session.environment().isolation().is_isolated()
    }
}

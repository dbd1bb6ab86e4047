//! `tracing` layer that hands each event to the browser console as one line.
//!
//! The sink is a plain function so the formatting and level handling run
//! natively; the wasm shim passes a sink that calls `console.<method>`.

use std::fmt::{self, Write as _};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Console method used for events at `level`.
#[must_use]
pub fn console_method(level: Level) -> &'static str {
    match level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        _ => "debug",
    }
}

/// Forwards events at or above `max_level` to `sink(level, line)`.
pub struct ConsoleLayer<F> {
    max_level: Level,
    sink: F,
}

impl<F> ConsoleLayer<F>
where
    F: Fn(Level, &str) + Send + Sync + 'static,
{
    pub fn new(max_level: Level, sink: F) -> Self {
        Self { max_level, sink }
    }
}

impl<S, F> Layer<S> for ConsoleLayer<F>
where
    S: Subscriber,
    F: Fn(Level, &str) + Send + Sync + 'static,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        *metadata.level() <= self.max_level
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut line = LineVisitor::default();
        event.record(&mut line);
        (self.sink)(*metadata.level(), &line.finish(metadata.target()));
    }
}

/// `target: message key=value key=value`
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self, target: &str) -> String {
        format!("{target}: {}{}", self.message, self.fields)
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}

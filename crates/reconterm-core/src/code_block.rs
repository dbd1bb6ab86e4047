//! A catalog command with its copy affordance.
//!
//! The block keeps the raw template and the current scope. The rendered
//! command seeds the terminal session and backs "Copy Template"; the raw
//! template backs "Copy Raw".

use std::cell::{Cell, RefCell};

use crate::clipboard::{ClipboardWriter, copy_best_effort};
use crate::template::{Scope, render};

/// How long the host shows the "Copied" state, in milliseconds.
pub const COPIED_FEEDBACK_MS: u32 = 2000;

#[derive(Debug)]
pub struct CodeBlock {
    template: String,
    scope: RefCell<Scope>,
    copied: Cell<bool>,
}

impl CodeBlock {
    #[must_use]
    pub fn new(template: impl Into<String>, scope: Scope) -> Self {
        Self {
            template: template.into(),
            scope: RefCell::new(scope),
            copied: Cell::new(false),
        }
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.template
    }

    /// Template rendered against the current scope.
    #[must_use]
    pub fn rendered(&self) -> String {
        render(&self.template, &self.scope.borrow())
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope.borrow().clone()
    }

    /// Swap in a new scope; returns the re-rendered command.
    pub fn set_scope(&self, scope: Scope) -> String {
        *self.scope.borrow_mut() = scope;
        self.rendered()
    }

    #[must_use]
    pub fn is_copied(&self) -> bool {
        self.copied.get()
    }

    /// Called by the host once [`COPIED_FEEDBACK_MS`] elapse.
    pub fn reset_copied(&self) {
        self.copied.set(false);
    }

    /// "Copy Template".
    pub async fn copy_rendered<C: ClipboardWriter>(&self, clipboard: &C) -> bool {
        let text = self.rendered();
        self.copy(clipboard, &text).await
    }

    /// "Copy Raw".
    pub async fn copy_raw<C: ClipboardWriter>(&self, clipboard: &C) -> bool {
        self.copy(clipboard, &self.template).await
    }

    async fn copy<C: ClipboardWriter>(&self, clipboard: &C, text: &str) -> bool {
        let ok = copy_best_effort(clipboard, text).await;
        if ok {
            self.copied.set(true);
        }
        ok
    }
}

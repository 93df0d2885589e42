// Dialog interception
//
// Pages raise alert/confirm/prompt through a `DialogChannel`, a capability the
// session hands to every document it opens. Handlers installed with
// `Session::intercept` answer the dialog instead of native UI, and every
// intercepted call is recorded in order. Session teardown uninstalls all
// handlers, so a dialog raised by a late page timer never reaches a test's
// stub.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type of browser dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    /// Alert dialog (OK button only)
    Alert,
    /// Confirm dialog (OK/Cancel buttons)
    Confirm,
    /// Prompt dialog (text input + OK/Cancel)
    Prompt,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alert => write!(f, "alert"),
            Self::Confirm => write!(f, "confirm"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

/// A dialog raised by the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialog {
    pub kind: DialogKind,
    pub message: String,
    /// Default input of prompt dialogs
    pub default_value: Option<String>,
}

impl Dialog {
    pub fn new(kind: DialogKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            default_value: None,
        }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self::new(DialogKind::Alert, message)
    }

    pub fn confirm(message: impl Into<String>) -> Self {
        Self::new(DialogKind::Confirm, message)
    }

    pub fn prompt(message: impl Into<String>, default_value: Option<String>) -> Self {
        Self {
            default_value,
            ..Self::new(DialogKind::Prompt, message)
        }
    }
}

/// How a dialog was answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DialogResponse {
    /// OK; prompts receive the optional text
    Accept(Option<String>),
    /// Cancel
    Dismiss,
}

impl DialogResponse {
    pub fn accept() -> Self {
        DialogResponse::Accept(None)
    }

    pub fn accept_with(text: impl Into<String>) -> Self {
        DialogResponse::Accept(Some(text.into()))
    }

    pub fn dismiss() -> Self {
        DialogResponse::Dismiss
    }

    /// Reply used when no handler is installed: alerts and confirms are
    /// accepted, prompts dismissed.
    pub fn default_for(kind: DialogKind) -> Self {
        match kind {
            DialogKind::Alert | DialogKind::Confirm => DialogResponse::accept(),
            DialogKind::Prompt => DialogResponse::dismiss(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, DialogResponse::Accept(_))
    }
}

/// One entry of the session's interceptor record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptedDialog {
    pub kind: DialogKind,
    pub message: String,
    pub response: DialogResponse,
}

/// Handler function type for dialogs
pub type DialogHandler = Arc<dyn Fn(&Dialog) -> DialogResponse + Send + Sync>;

#[derive(Default)]
struct Interceptors {
    handlers: HashMap<DialogKind, DialogHandler>,
    record: Vec<InterceptedDialog>,
}

/// Session-scoped dialog capability handed to documents.
#[derive(Clone, Default)]
pub struct DialogChannel {
    inner: Arc<Mutex<Interceptors>>,
}

impl DialogChannel {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn install(&self, kind: DialogKind, handler: DialogHandler) {
        tracing::debug!(%kind, "dialog interceptor installed");
        self.inner.lock().handlers.insert(kind, handler);
    }

    pub(crate) fn uninstall_all(&self) {
        let mut inner = self.inner.lock();
        if !inner.handlers.is_empty() {
            tracing::debug!(count = inner.handlers.len(), "dialog interceptors uninstalled");
        }
        inner.handlers.clear();
    }

    pub(crate) fn records(&self) -> Vec<InterceptedDialog> {
        self.inner.lock().record.clone()
    }

    /// Raises a dialog on behalf of the page and returns the reply.
    pub fn raise(&self, dialog: Dialog) -> DialogResponse {
        // The handler runs unlocked so it may call back into the session.
        let handler = self.inner.lock().handlers.get(&dialog.kind).cloned();
        match handler {
            Some(handler) => {
                let response = handler(&dialog);
                tracing::debug!(kind = %dialog.kind, message = %dialog.message, ?response, "dialog intercepted");
                self.inner.lock().record.push(InterceptedDialog {
                    kind: dialog.kind,
                    message: dialog.message,
                    response: response.clone(),
                });
                response
            }
            None => {
                let response = DialogResponse::default_for(dialog.kind);
                tracing::warn!(kind = %dialog.kind, message = %dialog.message, "dialog raised without an interceptor");
                response
            }
        }
    }
}

impl fmt::Debug for DialogChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("DialogChannel")
            .field("handlers", &inner.handlers.keys().collect::<Vec<_>>())
            .field("record", &inner.record)
            .finish()
    }
}

/// Recording dialog handler
///
/// # Example
///
/// ```ignore
/// let stub = DialogStub::new();
/// session.intercept(DialogKind::Alert, stub.handler());
/// // ... click something that alerts ...
/// stub.assert_called_with("Saved")?;
/// ```
#[derive(Clone)]
pub struct DialogStub {
    calls: Arc<Mutex<Vec<Dialog>>>,
    response: Option<DialogResponse>,
}

impl Default for DialogStub {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogStub {
    /// Stub answering every dialog with the default reply for its kind
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            response: None,
        }
    }

    /// Stub answering every dialog with `response`
    pub fn returning(response: DialogResponse) -> Self {
        Self {
            response: Some(response),
            ..Self::new()
        }
    }

    /// Handler to pass to `Session::intercept`
    pub fn handler(&self) -> DialogHandler {
        let calls = Arc::clone(&self.calls);
        let response = self.response.clone();
        Arc::new(move |dialog: &Dialog| {
            calls.lock().push(dialog.clone());
            response
                .clone()
                .unwrap_or_else(|| DialogResponse::default_for(dialog.kind))
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<Dialog> {
        self.calls.lock().clone()
    }

    pub fn get_call(&self, n: usize) -> Option<Dialog> {
        self.calls.lock().get(n).cloned()
    }

    pub fn last_call(&self) -> Option<Dialog> {
        self.calls.lock().last().cloned()
    }

    /// Checks the most recent call's message for exact equality.
    pub fn assert_called_with(&self, message: &str) -> Result<()> {
        match self.last_call() {
            Some(call) if call.message == message => Ok(()),
            Some(call) => Err(Error::AssertionFailed(format!(
                "expected last {} to be called with {:?}, but it was called with {:?}",
                call.kind, message, call.message
            ))),
            None => Err(Error::AssertionFailed(format!(
                "expected a dialog called with {:?}, but the stub was never called",
                message
            ))),
        }
    }

    /// Checks the `n`-th (0-based) call's message for exact equality.
    pub fn assert_nth_called_with(&self, n: usize, message: &str) -> Result<()> {
        match self.get_call(n) {
            Some(call) if call.message == message => Ok(()),
            Some(call) => Err(Error::AssertionFailed(format!(
                "expected call {} to be called with {:?}, but it was called with {:?}",
                n, message, call.message
            ))),
            None => Err(Error::AssertionFailed(format!(
                "expected call {} with {:?}, but the stub has {} call(s)",
                n,
                message,
                self.call_count()
            ))),
        }
    }
}

impl fmt::Debug for DialogStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogStub")
            .field("calls", &*self.calls.lock())
            .field("response", &self.response)
            .finish()
    }
}

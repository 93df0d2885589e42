// Page host - the collaborator side of a session
//
// A `Host` turns a URL into a live `Document`. The engine talks to documents
// only through the `Document` trait: selector queries, element snapshots and
// event dispatch. The in-process implementation (`Site`) renders `App`s into
// a DOM arena so that suites run without a browser binary.

pub mod app;
pub(crate) mod dom;
pub mod html;
pub mod selector;
pub mod site;

use crate::error::Result;
use crate::protocol::dialog::DialogChannel;
use crate::protocol::select_option::SelectOption;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

pub use app::{App, Context};
pub use html::{Html, VElement, h};
pub use site::Site;

/// Opaque reference to an element of one document.
///
/// Handles are only meaningful to the document that produced them. A handle
/// whose node was replaced by a re-render is stale and every operation on it
/// fails with `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ElementHandle {
    node: usize,
    epoch: u64,
}

impl ElementHandle {
    /// Creates a handle (for `Document` implementations)
    pub fn new(node: usize, epoch: u64) -> Self {
        Self { node, epoch }
    }

    /// Node index inside the producing document
    pub fn node(&self) -> usize {
        self.node
    }

    /// Render epoch the node was created in
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// Point-in-time view of one element, as the engine needs it for text
/// filters, actionability checks and assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Lower-case tag name
    pub tag_name: String,
    /// Concatenated text of all descendant text nodes
    pub text_content: String,
    /// Current value of form controls
    pub value: Option<String>,
    /// Not hidden by the element or an ancestor
    pub visible: bool,
    /// No `disabled` attribute
    pub enabled: bool,
    /// Accepts typed text (text inputs, textareas)
    pub editable: bool,
    /// Checkbox/radio state; `None` for other elements
    pub checked: Option<bool>,
    /// Covered by an inert region and cannot receive pointer events
    pub covered: bool,
    /// Currently holds input focus
    pub focused: bool,
}

/// Opens URLs into documents.
#[async_trait]
pub trait Host: Send + Sync {
    /// Loads `url` into a fresh document.
    ///
    /// `dialogs` is the session's dialog capability; the page raises alert,
    /// confirm and prompt through it for as long as the document lives.
    ///
    /// Fails with `NavigationError` for unreachable origins and non-success
    /// responses.
    async fn open(&self, url: &Url, dialogs: DialogChannel) -> Result<Arc<dyn Document>>;
}

/// A loaded page under test.
#[async_trait]
pub trait Document: Send + Sync {
    /// URL the document was loaded from
    fn url(&self) -> &Url;

    /// All elements matching `selector` in document order. With `scope`, only
    /// descendants of the scope elements, without duplicates.
    async fn query_selector_all(
        &self,
        selector: &str,
        scope: Option<&[ElementHandle]>,
    ) -> Result<Vec<ElementHandle>>;

    /// Current state of an element
    async fn snapshot(&self, element: &ElementHandle) -> Result<ElementSnapshot>;

    /// Dispatches a pointer activation. Performs no actionability checks.
    async fn click(&self, element: &ElementHandle) -> Result<()>;

    /// Moves input focus to the element
    async fn focus(&self, element: &ElementHandle) -> Result<()>;

    /// Appends one character to a text control and dispatches `input`
    async fn insert_char(&self, element: &ElementHandle, ch: char) -> Result<()>;

    /// Empties a text control and dispatches `input`
    async fn clear_value(&self, element: &ElementHandle) -> Result<()>;

    /// Selects the matching option of a `<select>`; returns its value
    async fn select_option(&self, element: &ElementHandle, option: &SelectOption)
    -> Result<String>;

    /// Releases the document; pending page timers are cancelled
    async fn close(&self);
}

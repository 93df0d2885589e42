// Site - in-process Host serving apps by path
//
// A site answers for one origin. Each mounted path creates a fresh app
// instance per navigation; messages queued through the app's Context are
// applied by a pump task, so the page keeps changing after an action returns
// the way a real UI does.

use super::app::{App, Context};
use super::dom::Dom;
use super::html::DomEvent;
use super::selector::Selector;
use super::{Document, ElementHandle, ElementSnapshot, Host};
use crate::error::{Error, Result};
use crate::protocol::dialog::DialogChannel;
use crate::protocol::select_option::SelectOption;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

type Factory = Arc<dyn Fn(&Url, DialogChannel) -> Arc<dyn Document> + Send + Sync>;

/// In-process host mounting apps under one origin
///
/// # Example
///
/// ```ignore
/// let site = Site::new("http://127.0.0.1:9999")?
///     .mount("/counter/index.html", Counter::default);
/// let session = Session::new(site, SessionOptions::default())?;
/// session.visit("http://127.0.0.1:9999/counter/index.html").await?;
/// ```
pub struct Site {
    origin: Url,
    routes: HashMap<String, Factory>,
}

impl Site {
    /// Creates an empty site for `origin` (e.g. `http://127.0.0.1:9999`)
    pub fn new(origin: &str) -> Result<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| Error::InvalidArgument(format!("origin '{}': {}", origin, e)))?;
        if origin.host_str().is_none() {
            return Err(Error::InvalidArgument(format!(
                "origin '{}' has no host",
                origin
            )));
        }
        Ok(Self {
            origin,
            routes: HashMap::new(),
        })
    }

    /// The site's origin URL
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Serves a fresh `init()` app at `path`
    pub fn mount<A, F>(mut self, path: &str, init: F) -> Self
    where
        A: App,
        F: Fn() -> A + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |url: &Url, dialogs: DialogChannel| {
            Arc::new(Mounted::start(url.clone(), init(), dialogs)) as Arc<dyn Document>
        });
        self.routes.insert(normalize_path(path), factory);
        self
    }

    fn same_origin(&self, url: &Url) -> bool {
        url.scheme() == self.origin.scheme()
            && url.host_str() == self.origin.host_str()
            && url.port_or_known_default() == self.origin.port_or_known_default()
    }
}

fn normalize_path(path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    if path.ends_with('/') {
        format!("{}index.html", path)
    } else {
        path
    }
}

#[async_trait]
impl Host for Site {
    async fn open(&self, url: &Url, dialogs: DialogChannel) -> Result<Arc<dyn Document>> {
        if !self.same_origin(url) {
            return Err(Error::NavigationError {
                url: url.to_string(),
                reason: "connection refused".into(),
            });
        }
        let Some(factory) = self.routes.get(&normalize_path(url.path())) else {
            return Err(Error::NavigationError {
                url: url.to_string(),
                reason: "404 Not Found".into(),
            });
        };
        tracing::debug!(%url, "page mounted");
        Ok(factory(url, dialogs))
    }
}

struct Runtime<A: App> {
    app: A,
    dom: Dom<A::Message>,
    ctx: Context<A::Message>,
    focused: Option<ElementHandle>,
}

impl<A: App> Runtime<A> {
    fn apply(&mut self, messages: Vec<A::Message>) {
        if messages.is_empty() {
            return;
        }
        for message in messages {
            self.app.update(message, &self.ctx);
        }
        self.dom = Dom::render(self.app.view(), Some(&self.dom));
    }
}

/// A running app behind the `Document` trait
struct Mounted<A: App> {
    url: Url,
    runtime: Arc<Mutex<Runtime<A>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<A: App> Mounted<A> {
    fn start(url: Url, app: A, dialogs: DialogChannel) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let dom = Dom::render(app.view(), None);
        let runtime = Arc::new(Mutex::new(Runtime {
            app,
            dom,
            ctx: Context::new(sender, dialogs),
            focused: None,
        }));
        let weak = Arc::downgrade(&runtime);
        let pump = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let Some(runtime) = weak.upgrade() else {
                    break;
                };
                runtime.lock().apply(vec![message]);
            }
        });
        Self {
            url,
            runtime,
            pump: Mutex::new(Some(pump)),
        }
    }

    fn shutdown(&self) {
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
            self.runtime.lock().ctx.cancel_timers();
        }
    }
}

impl<A: App> Drop for Mounted<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn is_focusable(tag: &str) -> bool {
    matches!(tag, "button" | "input" | "select" | "textarea" | "a")
}

#[async_trait]
impl<A: App> Document for Mounted<A> {
    fn url(&self) -> &Url {
        &self.url
    }

    async fn query_selector_all(
        &self,
        selector: &str,
        scope: Option<&[ElementHandle]>,
    ) -> Result<Vec<ElementHandle>> {
        let selector = Selector::parse(selector)?;
        let runtime = self.runtime.lock();
        let dom = &runtime.dom;
        let roots = match scope {
            Some(handles) => Some(
                handles
                    .iter()
                    .map(|h| dom.resolve(h))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };
        Ok(dom
            .query(&selector, roots.as_deref())
            .into_iter()
            .map(|id| dom.handle(id))
            .collect())
    }

    async fn snapshot(&self, element: &ElementHandle) -> Result<ElementSnapshot> {
        let runtime = self.runtime.lock();
        let dom = &runtime.dom;
        let id = dom.resolve(element)?;
        Ok(ElementSnapshot {
            tag_name: dom.tag(id).to_string(),
            text_content: dom.text_content(id),
            value: dom.value(id),
            visible: dom.is_visible(id),
            enabled: dom.is_enabled(id),
            editable: dom.is_editable(id),
            checked: dom.is_toggle(id).then(|| dom.checked(id)),
            covered: dom.is_covered(id),
            focused: runtime.focused == Some(*element),
        })
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        let mut runtime = self.runtime.lock();
        let id = runtime.dom.resolve(element)?;
        if is_focusable(runtime.dom.tag(id)) {
            runtime.focused = Some(*element);
        }

        let dom = &mut runtime.dom;
        let mut messages = Vec::new();
        if dom.is_toggle(id) {
            let checked = dom.attr(id, "type") == Some("radio") || !dom.checked(id);
            dom.set_checked(id, checked);
            messages.extend(dom.dispatch(id, &DomEvent::new("click")));
            messages.extend(dom.dispatch(id, &DomEvent::new("input").with_checked(checked)));
            messages.extend(dom.dispatch(id, &DomEvent::new("change").with_checked(checked)));
        } else {
            messages.extend(dom.dispatch(id, &DomEvent::new("click")));
        }

        let submits = dom.tag(id) == "button"
            && matches!(dom.attr(id, "type"), None | Some("submit"))
            && dom.is_enabled(id);
        if submits && let Some(form) = dom.closest(id, "form") {
            messages.extend(dom.dispatch(form, &DomEvent::new("submit")));
        }

        runtime.apply(messages);
        Ok(())
    }

    async fn focus(&self, element: &ElementHandle) -> Result<()> {
        let mut runtime = self.runtime.lock();
        runtime.dom.resolve(element)?;
        runtime.focused = Some(*element);
        Ok(())
    }

    async fn insert_char(&self, element: &ElementHandle, ch: char) -> Result<()> {
        let mut runtime = self.runtime.lock();
        let id = runtime.dom.resolve(element)?;
        let mut value = runtime.dom.value(id).unwrap_or_default();
        value.push(ch);
        runtime.dom.set_value(id, value.clone());
        let messages = runtime
            .dom
            .dispatch(id, &DomEvent::new("input").with_value(value));
        runtime.apply(messages);
        Ok(())
    }

    async fn clear_value(&self, element: &ElementHandle) -> Result<()> {
        let mut runtime = self.runtime.lock();
        let id = runtime.dom.resolve(element)?;
        runtime.dom.set_value(id, String::new());
        let messages = runtime.dom.dispatch(id, &DomEvent::new("input").with_value(""));
        runtime.apply(messages);
        Ok(())
    }

    async fn select_option(
        &self,
        element: &ElementHandle,
        option: &SelectOption,
    ) -> Result<String> {
        let mut runtime = self.runtime.lock();
        let dom = &mut runtime.dom;
        let id = dom.resolve(element)?;
        if dom.tag(id) != "select" {
            return Err(Error::InvalidArgument(format!(
                "select() requires a <select>, got <{}>",
                dom.tag(id)
            )));
        }

        let choices: Vec<(String, String)> = dom
            .options_of(id)
            .into_iter()
            .map(|o| (dom.option_value(o), dom.text_content(o)))
            .collect();
        let position = option
            .position(choices.iter().map(|(v, l)| (v.as_str(), l.as_str())))
            .ok_or_else(|| Error::OptionNotFound {
                option: option.to_string(),
                select: dom.attr(id, "id").map_or("select".to_string(), |i| format!("select#{}", i)),
            })?;
        let value = choices[position].0.clone();

        dom.set_value(id, value.clone());
        let mut messages = dom.dispatch(id, &DomEvent::new("input").with_value(value.clone()));
        messages.extend(dom.dispatch(id, &DomEvent::new("change").with_value(value.clone())));
        runtime.apply(messages);
        Ok(value)
    }

    async fn close(&self) {
        self.shutdown();
        tracing::debug!(url = %self.url, "page closed");
    }
}

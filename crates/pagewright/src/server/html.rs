// Virtual markup for in-process pages
//
// Apps describe their view as an `Html<M>` tree; listeners map DOM events to
// app messages. The tree is rendered into a `Dom` arena after every update.

use std::fmt;
use std::sync::Arc;

/// Event delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    /// Event type (`click`, `input`, `change`, `submit`)
    pub kind: String,
    /// Control value after the change (`input`/`change` on value controls)
    pub value: Option<String>,
    /// Checkbox state after the change
    pub checked: Option<bool>,
}

impl DomEvent {
    pub(crate) fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            value: None,
            checked: None,
        }
    }

    pub(crate) fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub(crate) fn with_checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }
}

/// Maps an event to an optional message
pub type Listener<M> = Arc<dyn Fn(&DomEvent) -> Option<M> + Send + Sync>;

/// A virtual node
pub enum Html<M> {
    Element(VElement<M>),
    Text(String),
}

/// A virtual element with attributes, children and listeners
pub struct VElement<M> {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<Html<M>>,
    pub(crate) listeners: Vec<(String, Listener<M>)>,
}

impl<M: 'static> VElement<M> {
    /// Creates an element with the given tag name
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Sets an attribute, replacing a previous value
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    /// Sets or removes a boolean attribute
    pub fn flag(mut self, name: &str, on: bool) -> Self {
        if on {
            self.attr(name, "")
        } else {
            let name = name.to_ascii_lowercase();
            self.attrs.retain(|(k, _)| *k != name);
            self
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn type_(self, type_: &str) -> Self {
        self.attr("type", type_)
    }

    pub fn for_(self, target: &str) -> Self {
        self.attr("for", target)
    }

    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value)
    }

    pub fn disabled(self, disabled: bool) -> Self {
        self.flag("disabled", disabled)
    }

    pub fn checked(self, checked: bool) -> Self {
        self.flag("checked", checked)
    }

    pub fn hidden(self, hidden: bool) -> Self {
        self.flag("hidden", hidden)
    }

    /// Appends a child node
    pub fn push(mut self, child: impl Into<Html<M>>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends every node of an iterator
    pub fn append<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Html<M>>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Adds a listener producing a message for every `event`
    pub fn on<F>(self, event: &str, f: F) -> Self
    where
        F: Fn(&DomEvent) -> M + Send + Sync + 'static,
    {
        self.on_maybe(event, move |e| Some(f(e)))
    }

    /// Adds a listener that may ignore the event
    pub fn on_maybe<F>(mut self, event: &str, f: F) -> Self
    where
        F: Fn(&DomEvent) -> Option<M> + Send + Sync + 'static,
    {
        self.listeners.push((event.to_string(), Arc::new(f)));
        self
    }

    /// Message from the control's value on every `input` event
    pub fn on_input<F>(self, f: F) -> Self
    where
        F: Fn(String) -> M + Send + Sync + 'static,
    {
        self.on_maybe("input", move |e| e.value.clone().map(&f))
    }

    /// Message from the checkbox state on every `change` event
    pub fn on_checked<F>(self, f: F) -> Self
    where
        F: Fn(bool) -> M + Send + Sync + 'static,
    {
        self.on_maybe("change", move |e| e.checked.map(&f))
    }

    fn map_with<N: 'static>(self, f: &Arc<dyn Fn(M) -> N + Send + Sync>) -> VElement<N> {
        let listeners = self
            .listeners
            .into_iter()
            .map(|(event, listener)| {
                let f = Arc::clone(f);
                let mapped: Listener<N> = Arc::new(move |e: &DomEvent| listener(e).map(|m| f(m)));
                (event, mapped)
            })
            .collect();
        VElement {
            tag: self.tag,
            attrs: self.attrs,
            children: self.children.into_iter().map(|c| c.map_with(f)).collect(),
            listeners,
        }
    }
}

impl<M: 'static> Html<M> {
    /// Lifts every message of this subtree, typically to embed a child
    /// component in a parent's message type.
    pub fn map<N: 'static, F>(self, f: F) -> Html<N>
    where
        F: Fn(M) -> N + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(M) -> N + Send + Sync> = Arc::new(f);
        self.map_with(&f)
    }

    fn map_with<N: 'static>(self, f: &Arc<dyn Fn(M) -> N + Send + Sync>) -> Html<N> {
        match self {
            Html::Element(element) => Html::Element(element.map_with(f)),
            Html::Text(text) => Html::Text(text),
        }
    }
}

impl<M> From<VElement<M>> for Html<M> {
    fn from(element: VElement<M>) -> Self {
        Html::Element(element)
    }
}

impl<M> From<&str> for Html<M> {
    fn from(text: &str) -> Self {
        Html::Text(text.to_string())
    }
}

impl<M> From<String> for Html<M> {
    fn from(text: String) -> Self {
        Html::Text(text)
    }
}

macro_rules! text_from_display {
    ($($t:ty),*) => {
        $(
            impl<M> From<$t> for Html<M> {
                fn from(value: $t) -> Self {
                    Html::Text(value.to_string())
                }
            }
        )*
    };
}

text_from_display!(i32, i64, u32, u64, usize, bool);

impl<M> fmt::Debug for VElement<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VElement")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("children", &self.children)
            .field(
                "listeners",
                &self.listeners.iter().map(|(e, _)| e.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<M> fmt::Debug for Html<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Html::Element(element) => element.fmt(f),
            Html::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

/// Element constructors
pub mod h {
    use super::VElement;

    macro_rules! elements {
        ($($name:ident),*) => {
            $(
                pub fn $name<M: 'static>() -> VElement<M> {
                    VElement::new(stringify!($name))
                }
            )*
        };
    }

    elements!(
        a, br, button, div, fieldset, form, h1, h2, input, label, li, main, option, p, pre,
        section, select, span, textarea, ul
    );

    /// Element with an arbitrary tag name
    pub fn element<M: 'static>(tag: &str) -> VElement<M> {
        VElement::new(tag)
    }
}

// DOM arena for in-process pages
//
// A render flattens `html > body > main > view` into a preorder arena. Node
// epochs implement positional reconciliation: a node keeps the epoch of the
// previous render's node at the same index when tag and parent match, so
// handles survive re-renders that do not restructure the page.

use super::ElementHandle;
use super::html::{DomEvent, Html, Listener};
use super::selector::{ElementTree, Selector};
use crate::error::{Error, Result};

enum NodeKind<M> {
    Element(Element<M>),
    Text(String),
}

struct Element<M> {
    tag_name: String,
    attrs: Vec<(String, String)>,
    value: String,
    checked: bool,
    listeners: Vec<(String, Listener<M>)>,
}

struct Node<M> {
    parent: Option<usize>,
    children: Vec<usize>,
    epoch: u64,
    kind: NodeKind<M>,
}

pub(crate) struct Dom<M> {
    nodes: Vec<Node<M>>,
    epoch: u64,
}

impl<M: 'static> Dom<M> {
    /// Renders `view` under `html > body > main`, reconciling against
    /// `previous` when given.
    pub(crate) fn render(view: Html<M>, previous: Option<&Dom<M>>) -> Self {
        let epoch = previous.map_or(1, |p| p.epoch + 1);
        let mut dom = Dom {
            nodes: Vec::new(),
            epoch,
        };
        let html = dom.push_element(None, "html", Vec::new(), Vec::new(), previous);
        let body = dom.push_element(Some(html), "body", Vec::new(), Vec::new(), previous);
        let main = dom.push_element(Some(body), "main", Vec::new(), Vec::new(), previous);
        dom.push_html(main, view, previous);
        dom.settle_select_values();
        dom
    }

    fn push_html(&mut self, parent: usize, node: Html<M>, previous: Option<&Dom<M>>) {
        match node {
            Html::Text(text) => {
                let id = self.nodes.len();
                let epoch = self.reconciled_epoch(id, Some(parent), None, previous);
                self.nodes.push(Node {
                    parent: Some(parent),
                    children: Vec::new(),
                    epoch,
                    kind: NodeKind::Text(text),
                });
                self.nodes[parent].children.push(id);
            }
            Html::Element(element) => {
                let id = self.push_element(
                    Some(parent),
                    &element.tag,
                    element.attrs,
                    element.listeners,
                    previous,
                );
                for child in element.children {
                    self.push_html(id, child, previous);
                }
            }
        }
    }

    fn push_element(
        &mut self,
        parent: Option<usize>,
        tag: &str,
        attrs: Vec<(String, String)>,
        listeners: Vec<(String, Listener<M>)>,
        previous: Option<&Dom<M>>,
    ) -> usize {
        let id = self.nodes.len();
        let epoch = self.reconciled_epoch(id, parent, Some(tag), previous);
        let checked = attrs.iter().any(|(k, _)| k == "checked");
        let value = match attrs.iter().find(|(k, _)| k == "value") {
            Some((_, v)) => v.clone(),
            // Uncontrolled controls keep what was typed into them.
            None if epoch != self.epoch => previous
                .and_then(|p| p.element(id))
                .map(|e| e.value.clone())
                .unwrap_or_default(),
            None => String::new(),
        };
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            epoch,
            kind: NodeKind::Element(Element {
                tag_name: tag.to_string(),
                attrs,
                value,
                checked,
                listeners,
            }),
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    fn reconciled_epoch(
        &self,
        id: usize,
        parent: Option<usize>,
        tag: Option<&str>,
        previous: Option<&Dom<M>>,
    ) -> u64 {
        let Some(old) = previous.and_then(|p| p.nodes.get(id)) else {
            return self.epoch;
        };
        let same_kind = match (&old.kind, tag) {
            (NodeKind::Element(e), Some(tag)) => e.tag_name == tag,
            (NodeKind::Text(_), None) => true,
            _ => false,
        };
        if same_kind && old.parent == parent {
            old.epoch
        } else {
            self.epoch
        }
    }

    fn settle_select_values(&mut self) {
        for id in 0..self.nodes.len() {
            let needs_default = matches!(
                &self.nodes[id].kind,
                NodeKind::Element(e) if e.tag_name == "select" && e.value.is_empty()
            );
            if needs_default
                && let Some(first) = self.options_of(id).first().copied()
            {
                let value = self.option_value(first);
                if let NodeKind::Element(e) = &mut self.nodes[id].kind {
                    e.value = value;
                }
            }
        }
    }

    fn element(&self, id: usize) -> Option<&Element<M>> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: usize) -> Option<&mut Element<M>> {
        match &mut self.nodes.get_mut(id)?.kind {
            NodeKind::Element(e) => Some(e),
            NodeKind::Text(_) => None,
        }
    }

    /// Resolves a handle to a node index; stale handles fail with `NotFound`.
    pub(crate) fn resolve(&self, handle: &ElementHandle) -> Result<usize> {
        let id = handle.node();
        match self.nodes.get(id) {
            Some(node) if node.epoch == handle.epoch() && matches!(node.kind, NodeKind::Element(_)) => {
                Ok(id)
            }
            _ => Err(Error::NotFound(format!(
                "element {} is detached from the document",
                id
            ))),
        }
    }

    pub(crate) fn handle(&self, id: usize) -> ElementHandle {
        ElementHandle::new(id, self.nodes[id].epoch)
    }

    /// Elements matching `selector` in document order, optionally restricted
    /// to strict descendants of `scope`.
    pub(crate) fn query(&self, selector: &Selector, scope: Option<&[usize]>) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|id| self.element(*id).is_some())
            .filter(|id| match scope {
                Some(roots) => roots.iter().any(|root| self.is_strict_descendant(*id, *root)),
                None => true,
            })
            .filter(|id| selector.matches(self, *id))
            .collect()
    }

    fn is_strict_descendant(&self, id: usize, root: usize) -> bool {
        let mut current = self.nodes[id].parent;
        while let Some(parent) = current {
            if parent == root {
                return true;
            }
            current = self.nodes[parent].parent;
        }
        false
    }

    fn ancestors_and_self(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(id), move |n| self.nodes[*n].parent)
    }

    pub(crate) fn text_content(&self, id: usize) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: usize, out: &mut String) {
        match &self.nodes[id].kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Element(_) => {
                for child in &self.nodes[id].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    pub(crate) fn tag(&self, id: usize) -> &str {
        self.element(id).map_or("", |e| e.tag_name.as_str())
    }

    pub(crate) fn attr(&self, id: usize, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn input_type(&self, id: usize) -> &str {
        self.attr(id, "type").unwrap_or("text")
    }

    pub(crate) fn is_visible(&self, id: usize) -> bool {
        if self.tag(id) == "input" && self.input_type(id) == "hidden" {
            return false;
        }
        !self.ancestors_and_self(id).any(|n| {
            self.attr(n, "hidden").is_some()
                || self.attr(n, "style").is_some_and(|style| {
                    style
                        .split(';')
                        .any(|decl| decl.replace(' ', "").eq_ignore_ascii_case("display:none"))
                })
        })
    }

    pub(crate) fn is_enabled(&self, id: usize) -> bool {
        self.attr(id, "disabled").is_none()
    }

    pub(crate) fn is_covered(&self, id: usize) -> bool {
        self.ancestors_and_self(id).any(|n| self.attr(n, "inert").is_some())
    }

    pub(crate) fn is_editable(&self, id: usize) -> bool {
        if self.attr(id, "readonly").is_some() {
            return false;
        }
        match self.tag(id) {
            "textarea" => true,
            "input" => matches!(
                self.input_type(id),
                "text" | "password" | "email" | "search" | "tel" | "url" | "number"
            ),
            _ => false,
        }
    }

    pub(crate) fn is_toggle(&self, id: usize) -> bool {
        self.tag(id) == "input" && matches!(self.input_type(id), "checkbox" | "radio")
    }

    pub(crate) fn checked(&self, id: usize) -> bool {
        self.element(id).is_some_and(|e| e.checked)
    }

    pub(crate) fn value(&self, id: usize) -> Option<String> {
        match self.tag(id) {
            "input" | "textarea" | "select" => self.element(id).map(|e| e.value.clone()),
            "option" => Some(self.option_value(id)),
            _ => None,
        }
    }

    pub(crate) fn set_value(&mut self, id: usize, value: String) {
        if let Some(e) = self.element_mut(id) {
            e.value = value;
        }
    }

    pub(crate) fn set_checked(&mut self, id: usize, checked: bool) {
        if let Some(e) = self.element_mut(id) {
            e.checked = checked;
        }
    }

    pub(crate) fn options_of(&self, select: usize) -> Vec<usize> {
        let mut options = Vec::new();
        let mut stack: Vec<usize> = self.nodes[select].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.tag(id) == "option" {
                options.push(id);
            } else {
                stack.extend(self.nodes[id].children.iter().rev().copied());
            }
        }
        options
    }

    pub(crate) fn option_value(&self, option: usize) -> String {
        self.attr(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.text_content(option))
    }

    pub(crate) fn closest(&self, id: usize, tag: &str) -> Option<usize> {
        self.ancestors_and_self(id).skip(1).find(|n| self.tag(*n) == tag)
    }

    /// Messages produced by `event` bubbling from `target` to the root.
    pub(crate) fn dispatch(&self, target: usize, event: &DomEvent) -> Vec<M> {
        self.ancestors_and_self(target)
            .filter_map(|n| self.element(n))
            .flat_map(|e| e.listeners.iter())
            .filter(|(kind, _)| *kind == event.kind)
            .filter_map(|(_, listener)| listener(event))
            .collect()
    }
}

impl<M: 'static> ElementTree for Dom<M> {
    fn tag_name(&self, node: usize) -> &str {
        self.tag(node)
    }

    fn attribute(&self, node: usize, name: &str) -> Option<&str> {
        self.attr(node, name)
    }

    fn parent_element(&self, node: usize) -> Option<usize> {
        self.nodes[node].parent
    }

    fn element_siblings(&self, node: usize) -> Vec<usize> {
        match self.nodes[node].parent {
            Some(parent) => self.nodes[parent]
                .children
                .iter()
                .copied()
                .filter(|c| self.element(*c).is_some())
                .collect(),
            None => vec![node],
        }
    }

    fn is_checked(&self, node: usize) -> bool {
        self.checked(node)
    }
}

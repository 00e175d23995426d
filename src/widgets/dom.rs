//! Minimal DOM surface the widgets render into.
//!
//! Widgets address nodes by element id, plus a couple of CSS selectors for
//! sections that are only shown or hidden. Operations on ids or selectors
//! that do not exist are silent no-ops, the same as a page that lacks the
//! widget markup.

use crate::utils::html_escape;
use std::collections::{BTreeMap, HashMap};

/// Id under which [`MemoryDom`] stores the document body.
pub const BODY_ID: &str = "body";

/// A detached element, built by a widget and then attached to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    /// Attributes in insertion order. An empty value renders as a bare
    /// boolean attribute.
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
        }
    }

    /// Set an attribute, replacing an earlier value for the same name.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    pub fn to_html(&self) -> String {
        let mut html = format!("<{}", self.tag);
        for (name, value) in &self.attrs {
            if value.is_empty() {
                html.push_str(&format!(" {name}"));
            } else {
                html.push_str(&format!(" {name}=\"{}\"", html_escape(value)));
            }
        }
        html.push_str(&format!("></{}>", self.tag));
        html
    }
}

/// The page operations the feed renderer and photo rotator need.
pub trait Dom {
    fn exists(&self, id: &str) -> bool;
    /// Replace the node's content with raw markup.
    fn set_inner_html(&mut self, id: &str, html: &str);
    /// Replace the node's content with plain text.
    fn set_text(&mut self, id: &str, text: &str);
    fn set_attribute(&mut self, id: &str, name: &str, value: &str);
    fn append_child(&mut self, parent_id: &str, child: Element);
    /// Element children of a node, in document order.
    fn children(&self, id: &str) -> Vec<Element>;
    /// Toggle `display: none` on the first element matching `selector`.
    fn set_hidden(&mut self, selector: &str, hidden: bool);
    fn append_to_body(&mut self, child: Element);
}

#[derive(Debug, Clone, Default)]
struct Node {
    markup: String,
    text: String,
    children: Vec<Element>,
    attrs: BTreeMap<String, String>,
}

/// An in-memory page with a fixed set of ids and selectors.
///
/// Used to preview widget output from the command line and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDom {
    nodes: HashMap<String, Node>,
    sections: HashMap<String, bool>,
}

impl MemoryDom {
    /// A page containing the given element ids and an empty body.
    pub fn with_ids(ids: &[&str]) -> Self {
        let mut dom = Self::default();
        dom.nodes.insert(BODY_ID.to_string(), Node::default());
        for id in ids {
            dom.nodes.insert(id.to_string(), Node::default());
        }
        dom
    }

    /// Add a selector-addressed section, initially visible.
    pub fn with_section(mut self, selector: &str) -> Self {
        self.sections.insert(selector.to_string(), false);
        self
    }

    /// Serialized content of a node: raw markup followed by child elements,
    /// or the escaped text if text was set last.
    pub fn inner_html(&self, id: &str) -> Option<String> {
        let node = self.nodes.get(id)?;
        if !node.text.is_empty() {
            return Some(html_escape(&node.text));
        }
        let mut html = node.markup.clone();
        for child in &node.children {
            html.push_str(&child.to_html());
        }
        Some(html)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.nodes.get(id).map(|n| n.text.as_str())
    }

    pub fn attribute(&self, id: &str, name: &str) -> Option<&str> {
        self.nodes.get(id)?.attrs.get(name).map(String::as_str)
    }

    pub fn is_hidden(&self, selector: &str) -> Option<bool> {
        self.sections.get(selector).copied()
    }
}

impl Dom for MemoryDom {
    fn exists(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn set_inner_html(&mut self, id: &str, html: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.markup = html.to_string();
            node.text.clear();
            node.children.clear();
        }
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.text = text.to_string();
            node.markup.clear();
            node.children.clear();
        }
    }

    fn set_attribute(&mut self, id: &str, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn append_child(&mut self, parent_id: &str, child: Element) {
        let child_id = child.id().map(str::to_string);
        let Some(parent) = self.nodes.get_mut(parent_id) else {
            return;
        };
        parent.text.clear();
        parent.children.push(child.clone());

        if let Some(child_id) = child_id {
            let attrs = child.attrs.into_iter().collect();
            self.nodes.entry(child_id).or_insert(Node {
                attrs,
                ..Node::default()
            });
        }
    }

    fn children(&self, id: &str) -> Vec<Element> {
        self.nodes
            .get(id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn set_hidden(&mut self, selector: &str, hidden: bool) {
        if let Some(state) = self.sections.get_mut(selector) {
            *state = hidden;
        }
    }

    fn append_to_body(&mut self, child: Element) {
        self.append_child(BODY_ID, child);
    }
}

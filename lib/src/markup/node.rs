use std::fmt;
use std::sync::Arc;

/// An ordered list of attributes. Order is preserved on serialization.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Attrs(Vec<(Arc<str>, String)>);

impl Attrs {
    pub fn new() -> Self {
        Attrs(vec![])
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter()
            .find(|(k, _)| &**k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        match self.0.iter_mut().find(|(k, _)| &**k == name) {
            Some((_, v)) => *v = value.into(),
            None => self.0.push((name.into(), value.into())),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let i = self.0.iter().position(|(k, _)| &**k == name)?;
        Some(self.0.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (&**k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<Arc<str>>, V: Into<String>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Attrs(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Snippet(Snippet),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: Arc<str>,
    pub attrs: Attrs,
    pub children: Vec<Node>,
}

/// Whether a snippet executes when it lands in a live page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SnippetState {
    /// Parsed inside a `<template>` or produced by cloning. Never executes.
    Inert,
    /// Freshly instantiated. Executes once when inserted.
    Live,
}

/// An executable `<script>`.
///
/// Cloning a snippet yields an [`SnippetState::Inert`] copy, as cloning a
/// script in a browser does: the clone keeps attributes and body but will not
/// run. Use [`Snippet::reinstantiate()`] for a copy that executes.
#[derive(Debug, PartialEq)]
pub struct Snippet {
    pub attrs: Attrs,
    pub body: String,
    state: SnippetState,
}

impl Snippet {
    pub fn new(attrs: Attrs, body: impl Into<String>) -> Self {
        Snippet { attrs, body: body.into(), state: SnippetState::Live }
    }

    pub(crate) fn inert(attrs: Attrs, body: impl Into<String>) -> Self {
        Snippet { attrs, body: body.into(), state: SnippetState::Inert }
    }

    pub fn state(&self) -> SnippetState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state == SnippetState::Live
    }

    pub fn src(&self) -> Option<&str> {
        self.attrs.get("src")
    }

    /// A fresh, live snippet with the same attributes and inline body.
    pub fn reinstantiate(&self) -> Snippet {
        Snippet::new(self.attrs.clone(), self.body.clone())
    }
}

impl Clone for Snippet {
    fn clone(&self) -> Self {
        Snippet::inert(self.attrs.clone(), self.body.clone())
    }
}

impl Element {
    pub fn new(name: &str) -> Self {
        Element { name: name.into(), attrs: Attrs::new(), children: vec![] }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }

        let value = match self.attr("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };

        self.attrs.set("class", value);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }

        let value = self.classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");

        self.attrs.set("class", value);
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut string = String::new();
        collect_text(&self.children, &mut string);
        string
    }

    /// Visits `self` and every descendant element in document order.
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Element)) {
        f(self);
        walk(&self.children, f);
    }

    /// Visits `self` and every descendant element in document order, mutably.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        walk_mut(&mut self.children, f);
    }

    /// Every element, `self` included, for which `pred` holds.
    pub fn select(&self, pred: impl Fn(&Element) -> bool) -> Vec<&Element> {
        let mut found = vec![];
        self.walk(&mut |e| if pred(e) { found.push(e) });
        found
    }
}

pub(crate) fn collect_text(nodes: &[Node], string: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => string.push_str(text),
            Node::Element(e) => collect_text(&e.children, string),
            Node::Snippet(_) | Node::Comment(_) => {}
        }
    }
}

pub fn walk<'a>(nodes: &'a [Node], f: &mut dyn FnMut(&'a Element)) {
    for node in nodes {
        if let Node::Element(e) = node {
            e.walk(f);
        }
    }
}

pub fn walk_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut Element)) {
    for node in nodes {
        if let Node::Element(e) = node {
            e.walk_mut(f);
        }
    }
}

/// Every snippet in `nodes`, in document order.
pub fn snippets(nodes: &[Node]) -> Vec<&Snippet> {
    fn collect<'a>(nodes: &'a [Node], found: &mut Vec<&'a Snippet>) {
        for node in nodes {
            match node {
                Node::Snippet(s) => found.push(s),
                Node::Element(e) => collect(&e.children, found),
                Node::Text(_) | Node::Comment(_) => {}
            }
        }
    }

    let mut found = vec![];
    collect(nodes, &mut found);
    found
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl From<Snippet> for Node {
    fn from(value: Snippet) -> Self {
        Node::Snippet(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        super::serialize::write_node(f, self, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloned_snippets_are_inert() {
        let live = Snippet::new(Attrs::from_iter([("src", "menu.js")]), "");
        assert!(live.is_live());

        let clone = live.clone();
        assert_eq!(clone.state(), SnippetState::Inert);
        assert_eq!(clone.src(), Some("menu.js"));

        let fresh = clone.reinstantiate();
        assert!(fresh.is_live());
        assert_eq!(fresh.attrs, live.attrs);
    }

    #[test]
    fn class_list_edits() {
        let mut a = Element::new("a").with_attr("class", "nav-link");
        a.add_class("active");
        a.add_class("active");
        assert_eq!(a.attr("class"), Some("nav-link active"));

        a.remove_class("nav-link");
        assert_eq!(a.attr("class"), Some("active"));
        assert!(a.has_class("active"));
        assert!(!a.has_class("nav-link"));
    }

    #[test]
    fn select_walks_in_document_order() {
        let tree = Element::new("ul")
            .with_child(Element::new("li").with_attr("id", "a")
                .with_child(Element::new("li").with_attr("id", "b")))
            .with_child(Element::new("li").with_attr("id", "c"));

        let ids: Vec<_> = tree.select(|e| e.is("li"))
            .into_iter()
            .filter_map(|e| e.id())
            .collect();

        assert_eq!(ids, ["a", "b", "c"]);
    }
}

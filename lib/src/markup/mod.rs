//! An owned, mutable HTML tree.
//!
//! Documents are parsed with an HTML5 parser and converted into plain owned
//! [`Node`]s which can be freely cloned, spliced, and serialized back out.
//! `<script>` elements become [`Snippet`]s so that their activation state can
//! be tracked across cloning and insertion.

mod node;
mod parse;
mod serialize;

use std::sync::Arc;

pub use node::*;
pub use serialize::to_html;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub doctype: Option<Arc<str>>,
    pub nodes: Vec<Node>,
}

impl Document {
    /// Parses a complete HTML document. Parsing never fails; malformed input
    /// is recovered from the way a browser would.
    pub fn parse(html: &str) -> Document {
        parse::document(html)
    }

    /// Parses `html` as the contents of an element, returning its nodes.
    pub fn parse_fragment(html: &str) -> Vec<Node> {
        parse::fragment(html)
    }

    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Element)) {
        walk(&self.nodes, f)
    }

    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        walk_mut(&mut self.nodes, f)
    }

    pub fn select(&self, pred: impl Fn(&Element) -> bool) -> Vec<&Element> {
        let mut found = vec![];
        self.walk(&mut |e| if pred(e) { found.push(e) });
        found
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Element> {
        self.select(|e| e.id() == Some(id)).into_iter().next()
    }

    /// Applies `f` to the first element with id `id`. Returns `false` if there
    /// is no such element.
    pub fn with_id_mut<F: FnOnce(&mut Element)>(&mut self, id: &str, f: F) -> bool {
        let mut f = Some(f);
        self.walk_mut(&mut |e| {
            if e.id() == Some(id) {
                if let Some(f) = f.take() {
                    f(e);
                }
            }
        });

        f.is_none()
    }

    pub fn snippets(&self) -> Vec<&Snippet> {
        snippets(&self.nodes)
    }

    pub fn text(&self) -> String {
        let mut string = String::new();
        node::collect_text(&self.nodes, &mut string);
        string
    }
}

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::markup::{self, Document, Element, Node};

/// The `id` prefix marking a `<template>` as a named fragment.
pub const TEMPLATE_PREFIX: &str = "tpl-";

/// A named, immutable blueprint of markup.
///
/// A fragment is never inserted itself: [`Fragment::instantiate()`] produces a
/// fresh, independently owned copy per use.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: Arc<str>,
    content: Arc<[Node]>,
}

impl Fragment {
    pub fn new(name: impl Into<Arc<str>>, content: Vec<Node>) -> Self {
        Fragment { name: name.into(), content: content.into() }
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    /// Deep-clones the content, replacing every (now inert) cloned snippet
    /// with a freshly instantiated live one carrying the same attributes and
    /// body.
    pub fn instantiate(&self) -> Vec<Node> {
        fn rearm(nodes: &mut [Node]) {
            for node in nodes {
                match node {
                    Node::Snippet(snippet) => *snippet = snippet.reinstantiate(),
                    Node::Element(e) => rearm(&mut e.children),
                    Node::Text(_) | Node::Comment(_) => {}
                }
            }
        }

        let mut nodes = self.content.to_vec();
        rearm(&mut nodes);
        nodes
    }
}

/// Every named fragment found in a partials document.
#[derive(Debug, Default, Clone)]
pub struct FragmentStore {
    fragments: FxHashMap<Arc<str>, Fragment>,
}

impl FragmentStore {
    pub fn new() -> Self {
        FragmentStore::default()
    }

    /// Collects every `<template id="tpl-NAME">` in `bytes` into a fragment
    /// named `NAME`. Later templates with the same name replace earlier ones.
    ///
    /// Never fails: input that yields no templates yields an empty store.
    pub fn parse(bytes: &[u8]) -> Self {
        Self::parse_with_prefix(bytes, TEMPLATE_PREFIX)
    }

    pub fn parse_with_prefix(bytes: &[u8], prefix: &str) -> Self {
        let html = String::from_utf8_lossy(bytes);
        let nodes = Document::parse_fragment(&html);

        let mut store = FragmentStore::new();
        markup::walk(&nodes, &mut |e: &Element| {
            if !e.is("template") {
                return;
            }

            let Some(name) = e.id().and_then(|id| id.strip_prefix(prefix)) else {
                return;
            };

            if !name.is_empty() {
                store.insert(Fragment::new(name, e.children.clone()));
            }
        });

        tracing::debug!(fragments = store.len(), "parsed partials document");
        store
    }

    pub fn insert(&mut self, fragment: Fragment) -> Option<Fragment> {
        self.fragments.insert(fragment.name.clone(), fragment)
    }

    pub fn get(&self, name: &str) -> Option<&Fragment> {
        self.fragments.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(|k| &**k)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{snippets, to_html, SnippetState};

    const PARTIALS: &str = r##"
        <template id="tpl-skip"><a class="skip" href="#main">Skip</a></template>
        <template id="tpl-navbar"><nav><a class="nav-link" href="index.html">Home</a></nav>
            <script src="js/menu.js" defer></script></template>
        <template id="tpl-footer"><footer>old</footer></template>
        <template id="tpl-footer"><footer>new</footer></template>
        <template id="unrelated"><p>ignored</p></template>
        <div id="tpl-div">not a template</div>
    "##;

    #[test]
    fn collects_prefixed_templates() {
        let store = FragmentStore::parse(PARTIALS.as_bytes());
        let mut names: Vec<_> = store.names().collect();
        names.sort();
        assert_eq!(names, ["footer", "navbar", "skip"]);
    }

    #[test]
    fn later_duplicates_win() {
        let store = FragmentStore::parse(PARTIALS.as_bytes());
        assert_eq!(to_html(store.get("footer").unwrap().content()), "<footer>new</footer>");
    }

    #[test]
    fn malformed_input_yields_empty_store() {
        assert!(FragmentStore::parse(b"\xff\xfe<<<").is_empty());
        assert!(FragmentStore::parse(b"").is_empty());
    }

    #[test]
    fn instances_are_independent_and_live() {
        let store = FragmentStore::parse(PARTIALS.as_bytes());
        let navbar = store.get("navbar").unwrap();

        let mut first = navbar.instantiate();
        let second = navbar.instantiate();
        assert_eq!(snippets(&first).len(), 1);
        assert!(snippets(&first).iter().all(|s| s.is_live()));
        assert!(snippets(&second).iter().all(|s| s.is_live()));
        assert!(snippets(navbar.content()).iter().all(|s| s.state() == SnippetState::Inert));

        crate::markup::walk_mut(&mut first, &mut |e| e.add_class("mutated"));
        assert!(!to_html(&second).contains("mutated"));
        assert!(!to_html(navbar.content()).contains("mutated"));
    }
}

use std::sync::Arc;

use crate::fragment::{Fragment, FragmentStore};
use crate::markup::{snippets, Document, Node, Snippet};

/// The order in which fragments are injected. Later fragments may depend on
/// the layout established by earlier ones.
pub const INJECTION_ORDER: [&str; 4] = ["skip", "preloader", "navbar", "footer"];

/// The attribute naming the fragment a mount point requests.
pub const MOUNT_ATTR: &str = "data-include";

/// Receives every live snippet as its fragment instance is inserted.
pub trait SnippetHost {
    fn activate(&mut self, snippet: &Snippet);
}

impl SnippetHost for () {
    fn activate(&mut self, _: &Snippet) { }
}

impl<F: FnMut(&Snippet)> SnippetHost for F {
    fn activate(&mut self, snippet: &Snippet) {
        self(snippet)
    }
}

#[derive(Debug, Clone)]
pub struct PartialComposer {
    order: Vec<Arc<str>>,
    mount_attr: Arc<str>,
}

impl Default for PartialComposer {
    fn default() -> Self {
        PartialComposer {
            order: INJECTION_ORDER.iter().map(|&n| n.into()).collect(),
            mount_attr: MOUNT_ATTR.into(),
        }
    }
}

impl PartialComposer {
    pub fn new() -> Self {
        PartialComposer::default()
    }

    pub fn with_order<I, S>(mut self, order: I) -> Self
        where I: IntoIterator<Item = S>, S: Into<Arc<str>>
    {
        self.order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mount_attr(mut self, attr: &str) -> Self {
        self.mount_attr = attr.into();
        self
    }

    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|n| &**n)
    }

    /// Replaces every mount point in `document` with an instance of the
    /// fragment it names, one fragment at a time in injection order.
    ///
    /// Fragments missing from `store` and mount points naming unknown
    /// fragments are left alone.
    pub fn compose<H>(&self, store: &FragmentStore, document: &mut Document, host: &mut H)
        where H: SnippetHost + ?Sized
    {
        self.compose_nodes(store, &mut document.nodes, host)
    }

    pub fn compose_nodes<H>(&self, store: &FragmentStore, nodes: &mut Vec<Node>, host: &mut H)
        where H: SnippetHost + ?Sized
    {
        for name in &self.order {
            let Some(fragment) = store.get(name) else {
                tracing::debug!(fragment = &**name, "no such fragment; skipping");
                continue;
            };

            let mounts = inject(nodes, &self.mount_attr, fragment, host);
            tracing::debug!(fragment = &**name, mounts, "injected fragment");
        }
    }
}

// Mounts inside a freshly inserted instance are not revisited for the same
// fragment: the set of mounts is the one present before injection began.
fn inject<H>(nodes: &mut Vec<Node>, attr: &str, fragment: &Fragment, host: &mut H) -> usize
    where H: SnippetHost + ?Sized
{
    let mut mounts = 0;
    let mut i = 0;
    while i < nodes.len() {
        let element = match &mut nodes[i] {
            Node::Element(e) => e,
            _ => { i += 1; continue; }
        };

        if element.attr(attr) != Some(&*fragment.name) {
            mounts += inject(&mut element.children, attr, fragment, host);
            i += 1;
            continue;
        }

        let instance = fragment.instantiate();
        let len = instance.len();
        nodes.splice(i..i + 1, instance);
        for snippet in snippets(&nodes[i..i + len]) {
            host.activate(snippet);
        }

        mounts += 1;
        i += len;
    }

    mounts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::to_html;

    const PARTIALS: &str = r##"
        <template id="tpl-skip"><a class="skip-link" href="#main">Skip</a></template>
        <template id="tpl-preloader"><div class="preloader"></div></template>
        <template id="tpl-navbar"><nav><a class="nav-link" href="index.html">Home</a></nav><script src="js/nav.js"></script></template>
        <template id="tpl-footer"><footer><div data-include="navbar"></div><script>year()</script></footer></template>
    "##;

    fn store() -> FragmentStore {
        FragmentStore::parse(PARTIALS.as_bytes())
    }

    fn body(html: &str) -> Document {
        Document { doctype: None, nodes: Document::parse_fragment(html) }
    }

    #[test]
    fn replaces_every_mount() {
        let mut page = body(r#"<div data-include="navbar"></div><main>x</main><div data-include="navbar"></div>"#);
        PartialComposer::new().compose(&store(), &mut page, &mut ());

        let html = to_html(&page.nodes);
        assert_eq!(html.matches("<nav>").count(), 2);
        assert!(!html.contains("data-include"));
        assert!(html.contains("<main>x</main>"));
    }

    #[test]
    fn unknown_mounts_are_left_in_place() {
        let mut page = body(r#"<div data-include="sidebar">placeholder</div>"#);
        let before = page.clone();
        PartialComposer::new().compose(&store(), &mut page, &mut ());
        assert_eq!(page, before);

        let mut page = body(r#"<div data-include="navbar"></div>"#);
        PartialComposer::new().compose(&FragmentStore::new(), &mut page, &mut ());
        assert_eq!(to_html(&page.nodes), r#"<div data-include="navbar"></div>"#);
    }

    #[test]
    fn snippets_activate_once_per_mount_in_order() {
        let mut page = body(r#"<div data-include="footer"></div><div data-include="navbar"></div>
            <div data-include="navbar"></div><div data-include="skip"></div>"#);

        let mut activated = vec![];
        let mut host = |s: &Snippet| activated.push(s.src().unwrap_or(&s.body).to_string());
        PartialComposer::new().compose(&store(), &mut page, &mut host);

        // navbar goes before footer; the navbar mount inside the footer is
        // resolved only if the footer was already present, which it isn't.
        assert_eq!(activated, ["js/nav.js", "js/nav.js", "year()"]);
        assert!(page.snippets().iter().all(|s| s.is_live()));
        assert_eq!(page.select(|e| e.attr(MOUNT_ATTR).is_some()).len(), 1);
    }

    #[test]
    fn fixed_order_resolves_dependent_mounts() {
        let composer = PartialComposer::new().with_order(["footer", "navbar"]);
        let mut page = body(r#"<div data-include="footer"></div>"#);
        composer.compose(&store(), &mut page, &mut ());
        assert_eq!(page.select(|e| e.is("nav")).len(), 1);
        assert!(page.select(|e| e.attr(MOUNT_ATTR).is_some()).is_empty());
    }

    #[test]
    fn custom_mount_attribute() {
        let composer = PartialComposer::new().with_mount_attr("data-partial");
        assert_eq!(composer.order().collect::<Vec<_>>(), INJECTION_ORDER);

        let mut page = body(r#"<div data-partial="navbar"></div><div data-include="navbar"></div>"#);
        composer.compose(&store(), &mut page, &mut ());
        assert_eq!(page.select(|e| e.is("nav")).len(), 1);
        assert_eq!(page.select(|e| e.attr(MOUNT_ATTR).is_some()).len(), 1);
        assert!(page.select(|e| e.attr("data-partial").is_some()).is_empty());
    }

    #[test]
    fn self_referencing_mounts_are_not_revisited() {
        let mut store = FragmentStore::new();
        store.insert(Fragment::new("skip", Document::parse_fragment(r#"<div data-include="skip"></div>"#)));

        let mut page = body(r#"<div data-include="skip"></div>"#);
        PartialComposer::new().compose(&store, &mut page, &mut ());
        assert_eq!(to_html(&page.nodes), r#"<div data-include="skip"></div>"#);
    }
}

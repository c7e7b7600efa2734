use std::sync::Arc;

use parking_lot::Mutex;

use crate::markup::{to_html, Document, Node};

/// A shared mount for generated markup.
///
/// Contents are only ever replaced whole: readers see one complete render or
/// another, never a mix.
#[derive(Debug, Clone, Default)]
pub struct Container {
    inner: Arc<Mutex<Mounted>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Mounted {
    nodes: Vec<Node>,
    replacements: u64,
}

impl Container {
    pub fn new() -> Self {
        Container::default()
    }

    pub fn replace(&self, nodes: Vec<Node>) {
        let mut mounted = self.inner.lock();
        mounted.nodes = nodes;
        mounted.replacements += 1;
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.inner.lock().nodes.clone()
    }

    pub fn html(&self) -> String {
        to_html(&self.inner.lock().nodes)
    }

    /// How many times the contents have been replaced.
    pub fn replacements(&self) -> u64 {
        self.inner.lock().replacements
    }

    /// Makes the current contents the children of the element with id `id` in
    /// `document`. Returns `false` if there's no such element.
    pub fn mount_into(&self, document: &mut Document, id: &str) -> bool {
        let nodes = self.nodes();
        document.with_id_mut(id, move |element| element.children = nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(Container: Send, Sync, Clone);

    #[test]
    fn replaces_whole_and_mounts() {
        let container = Container::new();
        container.replace(Document::parse_fragment("<p>one</p><p>two</p>"));
        container.replace(Document::parse_fragment("<p>three</p>"));
        assert_eq!(container.html(), "<p>three</p>");
        assert_eq!(container.replacements(), 2);

        let mut page = Document::parse("<main><section id=\"events\">loading</section></main>");
        assert!(container.mount_into(&mut page, "events"));
        assert!(!container.mount_into(&mut page, "missing"));
        assert_eq!(page.get_by_id("events").unwrap().to_string(),
            "<section id=\"events\"><p>three</p></section>");
    }
}

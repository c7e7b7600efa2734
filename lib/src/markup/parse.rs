use std::sync::Arc;

use scraper::{ElementRef, Html, Node as HtmlNode};

use crate::markup::{Attrs, Document, Element, Node, Snippet};

pub fn document(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let doctype = parsed.tree.root()
        .children()
        .find_map(|n| match n.value() {
            HtmlNode::Doctype(d) => Some(Arc::<str>::from(d.name())),
            _ => None,
        });

    Document { doctype, nodes: vec![convert(parsed.root_element(), false)] }
}

pub fn fragment(html: &str) -> Vec<Node> {
    let parsed = Html::parse_fragment(html);
    children(parsed.root_element(), false)
}

fn children(parent: ElementRef<'_>, in_template: bool) -> Vec<Node> {
    let mut nodes = vec![];
    for child in parent.children() {
        if let Some(element) = ElementRef::wrap(child) {
            nodes.push(convert(element, in_template));
            continue;
        }

        match child.value() {
            HtmlNode::Text(text) => nodes.push(Node::Text(String::from(&**text))),
            HtmlNode::Comment(comment) => nodes.push(Node::Comment(String::from(&**comment))),
            _ => {}
        }
    }

    nodes
}

// Template contents are kept as the template's children. Scripts found there
// are inert, as they are in a browser.
fn convert(element: ElementRef<'_>, in_template: bool) -> Node {
    let value = element.value();
    let attrs: Attrs = value.attrs().collect();
    if value.name().eq_ignore_ascii_case("script") {
        let body: String = element.text().collect();
        return match in_template {
            true => Snippet::inert(attrs, body).into(),
            false => Snippet::new(attrs, body).into(),
        };
    }

    let in_template = in_template || value.name().eq_ignore_ascii_case("template");
    Node::Element(Element {
        name: value.name().into(),
        attrs,
        children: children(element, in_template),
    })
}

#[cfg(test)]
mod tests {
    use crate::markup::*;

    #[test]
    fn parses_and_serializes_documents() {
        let html = "<!DOCTYPE html><html><head><title>About</title></head>\
            <body><div data-include=\"navbar\"></div><p>Hi &amp; bye</p></body></html>";

        let doc = Document::parse(html);
        assert_eq!(doc.doctype.as_deref(), Some("html"));
        assert_eq!(doc.to_string(), html);
    }

    #[test]
    fn scripts_in_templates_are_inert() {
        let nodes = Document::parse_fragment("<template id=\"tpl-footer\">\
            <footer>x</footer><script src=\"f.js\"></script></template>\
            <script>boot()</script>");

        let snippets = snippets(&nodes);
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].state(), SnippetState::Inert);
        assert_eq!(snippets[0].src(), Some("f.js"));
        assert_eq!(snippets[1].state(), SnippetState::Live);
        assert_eq!(snippets[1].body, "boot()");
    }

    #[test]
    fn garbage_parses_without_failing() {
        let nodes = Document::parse_fragment("<<>></div></template>&&");
        assert!(snippets(&nodes).is_empty());
    }
}

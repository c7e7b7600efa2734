use std::fmt::{self, Write};

use crate::markup::{Document, Element, Node, Snippet};

const VOID: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "source", "track", "wbr",
];

const RAW_TEXT: &[&str] = &[
    "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

fn is_one_of(name: &str, set: &[&str]) -> bool {
    set.iter().any(|n| name.eq_ignore_ascii_case(n))
}

fn escape<W: Write>(w: &mut W, string: &str, attr: bool) -> fmt::Result {
    let mut last = 0;
    for (i, b) in string.bytes().enumerate() {
        let rep = match b {
            b'&' => "&amp;",
            b'"' if attr => "&quot;",
            b'<' if !attr => "&lt;",
            b'>' if !attr => "&gt;",
            _ => continue,
        };

        w.write_str(&string[last..i])?;
        w.write_str(rep)?;
        last = i + 1;
    }

    w.write_str(&string[last..])
}

fn write_attrs<W: Write>(w: &mut W, attrs: &crate::markup::Attrs) -> fmt::Result {
    for (name, value) in attrs.iter() {
        write!(w, " {name}=\"")?;
        escape(w, value, true)?;
        w.write_char('"')?;
    }

    Ok(())
}

fn write_element<W: Write>(w: &mut W, e: &Element) -> fmt::Result {
    write!(w, "<{}", e.name)?;
    write_attrs(w, &e.attrs)?;
    w.write_char('>')?;
    if is_one_of(&e.name, VOID) {
        return Ok(());
    }

    let raw = is_one_of(&e.name, RAW_TEXT);
    for child in &e.children {
        write_node(w, child, raw)?;
    }

    write!(w, "</{}>", e.name)
}

fn write_snippet<W: Write>(w: &mut W, s: &Snippet) -> fmt::Result {
    w.write_str("<script")?;
    write_attrs(w, &s.attrs)?;
    write!(w, ">{}</script>", s.body)
}

pub(crate) fn write_node<W: Write>(w: &mut W, node: &Node, raw: bool) -> fmt::Result {
    match node {
        Node::Element(e) => write_element(w, e),
        Node::Snippet(s) => write_snippet(w, s),
        Node::Text(text) if raw => w.write_str(text),
        Node::Text(text) => escape(w, text, false),
        Node::Comment(text) => write!(w, "<!--{text}-->"),
    }
}

/// Serializes `nodes` as HTML.
pub fn to_html(nodes: &[Node]) -> String {
    let mut html = String::new();
    for node in nodes {
        // Writing to a `String` is infallible.
        let _ = write_node(&mut html, node, false);
    }

    html
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(doctype) = &self.doctype {
            write!(f, "<!DOCTYPE {doctype}>")?;
        }

        self.nodes.iter().try_for_each(|node| write_node(f, node, false))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_element(f, self)
    }
}

//! HTML parsing into a [`Document`], backed by `scraper`.

use scraper::{ElementRef, Html, Node};

use super::{Document, NodeId};

/// Parses a full HTML document.
///
/// The html5ever tree builder repairs malformed markup, so this never fails;
/// a missing `<head>` or `<body>` is synthesized the way browsers do.
/// Whitespace-only text nodes and comments are kept so serialization
/// preserves the author's layout.
pub fn parse_html(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let mut doc = Document::new();
    let root = doc.root();
    for child in parsed.tree.root().children() {
        if let Some(element) = ElementRef::wrap(child) {
            convert_element(&mut doc, root, element);
        } else if let Node::Comment(c) = child.value() {
            let id = doc.create_comment(&c.comment);
            doc.append(root, id);
        }
    }
    doc
}

fn convert_element(doc: &mut Document, parent: NodeId, el: ElementRef<'_>) {
    let id = doc.create_element(el.value().name());
    for (name, value) in el.value().attrs() {
        doc.set_attr(id, name, value);
    }
    doc.append(parent, id);

    for child in el.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    convert_element(doc, id, child_el);
                }
            }
            Node::Text(t) => {
                doc.append_text(id, &t.text);
            }
            Node::Comment(c) => {
                let comment = doc.create_comment(&c.comment);
                doc.append(id, comment);
            }
            _ => {}
        }
    }
}

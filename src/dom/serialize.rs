//! HTML serialization of a [`Document`] through html5ever's serializer.

use std::io;

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::{LocalName, Namespace, QualName};

use super::{Document, NodeData, NodeId};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Elements whose leading newline the parser swallows; it must be written
/// twice to survive a reparse.
const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// A node of a [`Document`] that html5ever can serialize.
struct SerializableNode<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => write_node(self.doc, self.id, serializer),
            TraversalScope::ChildrenOnly(_) => write_children(self.doc, self.id, serializer),
        }
    }
}

fn element_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(name))
}

fn write_children<S: Serializer>(doc: &Document, id: NodeId, serializer: &mut S) -> io::Result<()> {
    for child in doc.children(id) {
        write_node(doc, *child, serializer)?;
    }
    Ok(())
}

fn write_node<S: Serializer>(doc: &Document, id: NodeId, serializer: &mut S) -> io::Result<()> {
    match doc.data(id) {
        NodeData::Document => write_children(doc, id, serializer),
        NodeData::Text(text) => serializer.write_text(text),
        NodeData::Comment(text) => serializer.write_comment(text),
        NodeData::Element(element) => {
            let name = element_name(&element.name);
            let attrs: Vec<(QualName, &str)> = element
                .attrs
                .iter()
                .map(|(k, v)| {
                    let attr = QualName::new(None, Namespace::from(""), LocalName::from(k.as_str()));
                    (attr, v.as_str())
                })
                .collect();
            serializer.start_elem(name.clone(), attrs.iter().map(|(k, v)| (k, *v)))?;

            if LEADING_NEWLINE_ELEMENTS.contains(&element.name.as_str())
                && let Some(first) = doc.children(id).first()
                && let NodeData::Text(text) = doc.data(*first)
                && text.starts_with('\n')
            {
                serializer.write_text("\n")?;
            }

            write_children(doc, id, serializer)?;
            serializer.end_elem(name)
        }
    }
}

fn serialize_node(doc: &Document, id: NodeId, traversal_scope: TraversalScope, out: &mut Vec<u8>) {
    let opts = SerializeOpts {
        traversal_scope,
        ..SerializeOpts::default()
    };
    // Writing into a Vec<u8> cannot fail.
    if let Err(err) = serialize(&mut *out, &SerializableNode { doc, id }, opts) {
        log::error!("html serialization failed: {err}");
    }
}

/// Serializes the whole document with an HTML5 doctype.
pub fn to_html(doc: &Document) -> String {
    let mut bytes = b"<!DOCTYPE html>\n".to_vec();
    serialize_node(doc, doc.root(), TraversalScope::ChildrenOnly(None), &mut bytes);
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Serializes one node including its own tag.
pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut bytes = Vec::new();
    serialize_node(doc, id, TraversalScope::IncludeNode, &mut bytes);
    String::from_utf8_lossy(&bytes).into_owned()
}

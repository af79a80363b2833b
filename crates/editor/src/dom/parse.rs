//! HTML reader backed by html5ever.
//!
//! Content is parsed as the children of a `<body>`, so markup is repaired
//! the way a browser repairs it. The parsed tree is copied into the arena
//! with an explicit work stack.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, QualName, local_name, namespace_url, ns, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData as ParsedData, RcDom};

use super::{Document, Element, NodeData, NodeId};

/// Deepest element nesting kept when reading content.
pub const MAX_NESTING_DEPTH: usize = 512;

/// Parse `html` and append its nodes to `parent`.
pub(super) fn read_into(doc: &mut Document, parent: NodeId, html: &str) {
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("body")),
        Vec::new(),
    )
    .one(html);

    // Fragment content hangs off a synthetic <html> element.
    let mut pending: Vec<(Handle, NodeId, usize)> = Vec::new();
    for top in dom.document.children.borrow().iter().rev() {
        if is_html_element(top) {
            let children = top.children.borrow();
            pending.extend(children.iter().rev().map(|c| (c.clone(), parent, 0)));
        } else {
            pending.push((top.clone(), parent, 0));
        }
    }

    while let Some((node, parent, depth)) = pending.pop() {
        match &node.data {
            ParsedData::Text { contents } => {
                doc.append_node(parent, NodeData::Text(owned(&contents.borrow())));
            }
            ParsedData::Comment { contents } => {
                doc.append_node(parent, NodeData::Comment(owned(contents)));
            }
            ParsedData::Element { name, attrs, .. } => {
                let target = if depth < MAX_NESTING_DEPTH {
                    let mut element = Element::new(&name.local);
                    for attr in attrs.borrow().iter() {
                        element.set_attr(&attr.name.local, owned(&attr.value));
                    }
                    doc.append_node(parent, NodeData::Element(element))
                } else {
                    parent
                };
                let children = node.children.borrow();
                pending.extend(children.iter().rev().map(|c| (c.clone(), target, depth + 1)));
            }
            ParsedData::Document
            | ParsedData::Doctype { .. }
            | ParsedData::ProcessingInstruction { .. } => {}
        }
    }
}

fn is_html_element(node: &Handle) -> bool {
    matches!(&node.data, ParsedData::Element { name, .. } if name.local == local_name!("html"))
}

fn owned(text: &str) -> String {
    text.to_string()
}

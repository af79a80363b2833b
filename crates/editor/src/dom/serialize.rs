//! HTML serialization for documents and fragments.
//!
//! Attribute values are always double-quoted and escaped; empty values are
//! written as bare boolean attributes (`controls`).

use super::{Document, Element, FragmentNode, NodeData, NodeId, is_void_element};

/// Elements whose text children are written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "plaintext", "script", "style", "xmp",
];

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attribute(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_open_tag(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(element.tag());
    for (name, value) in element.attributes() {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
    }
    out.push('>');
}

fn write_close_tag(out: &mut String, element: &Element) {
    out.push_str("</");
    out.push_str(element.tag());
    out.push('>');
}

fn write_text(out: &mut String, text: &str, raw: bool) {
    if raw {
        out.push_str(text);
    } else {
        out.push_str(&escape_text(text));
    }
}

fn write_comment(out: &mut String, text: &str) {
    out.push_str("<!--");
    out.push_str(&text.replace("-->", "--&gt;"));
    out.push_str("-->");
}

/// Pending serializer work: enter a node, or close an element.
enum Step<'a, N> {
    Enter(N, bool),
    Leave(&'a Element),
}

fn is_raw_text(element: &Element) -> bool {
    RAW_TEXT_ELEMENTS.contains(&element.tag())
}

pub(super) fn write_node(out: &mut String, doc: &Document, id: NodeId) {
    let mut steps = vec![Step::Enter(id, false)];
    while let Some(step) = steps.pop() {
        let (id, raw_parent) = match step {
            Step::Leave(element) => {
                write_close_tag(out, element);
                continue;
            }
            Step::Enter(id, raw_parent) => (id, raw_parent),
        };
        match doc.data(id) {
            Some(NodeData::Element(element)) => {
                write_open_tag(out, element);
                if is_void_element(element.tag()) {
                    continue;
                }
                steps.push(Step::Leave(element));
                let raw = is_raw_text(element);
                steps.extend(doc.children(id).iter().rev().map(|c| Step::Enter(*c, raw)));
            }
            Some(NodeData::Text(text)) => write_text(out, text, raw_parent),
            Some(NodeData::Comment(text)) => write_comment(out, text),
            Some(NodeData::Root) => {
                steps.extend(doc.children(id).iter().rev().map(|c| Step::Enter(*c, false)));
            }
            None => {}
        }
    }
}

pub(super) fn write_fragment(out: &mut String, fragment: &FragmentNode) {
    let mut steps = vec![Step::Enter(fragment, false)];
    while let Some(step) = steps.pop() {
        let (node, raw_parent) = match step {
            Step::Leave(element) => {
                write_close_tag(out, element);
                continue;
            }
            Step::Enter(node, raw_parent) => (node, raw_parent),
        };
        match node {
            FragmentNode::Element { element, children } => {
                write_open_tag(out, element);
                if is_void_element(element.tag()) {
                    continue;
                }
                steps.push(Step::Leave(element));
                let raw = is_raw_text(element);
                steps.extend(children.iter().rev().map(|c| Step::Enter(c, raw)));
            }
            FragmentNode::Text(text) => write_text(out, text, raw_parent),
            FragmentNode::Comment(text) => write_comment(out, text),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn attribute_values_cannot_break_out() {
        let element = Element::new("video")
            .with_attr("data-filename", r#""><script>alert(1)</script>"#)
            .with_attr("controls", "");
        let html = FragmentNode::element(element).to_html();
        assert_eq!(
            html,
            r#"<video data-filename="&quot;&gt;&lt;script&gt;alert(1)&lt;/script&gt;" controls></video>"#
        );
    }

    #[test]
    fn text_is_escaped_but_style_is_raw() {
        let frag = FragmentNode::element(Element::new("p")).with_child(FragmentNode::text("a < b & c"));
        assert_eq!(frag.to_html(), "<p>a &lt; b &amp; c</p>");

        let style = FragmentNode::element(Element::new("style"))
            .with_child(FragmentNode::text(".a > .b {}"));
        assert_eq!(style.to_html(), "<style>.a > .b {}</style>");
    }

    #[test]
    fn void_elements_have_no_close_tag() {
        let img = FragmentNode::element(Element::new("img").with_attr("src", "a.png"));
        assert_eq!(img.to_html(), r#"<img src="a.png">"#);
    }
}

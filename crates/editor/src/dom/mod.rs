//! In-memory document model used by the headless editor surface.
//!
//! An arena of nodes addressed by [`NodeId`]. Removed nodes are detached
//! from their parent and never reused, so stale ids stay harmless: lookups
//! on a detached node report it as not attached. Building, walking and
//! serializing never recurse, so nesting depth only costs heap.

mod parse;
mod serialize;

pub use parse::MAX_NESTING_DEPTH;
pub use serialize::{escape_attribute, escape_text};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Index of a node in its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element's tag name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
}

impl Element {
    /// Create an element; the tag is lowercased.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    /// Builder form of [`Element::set_attr`].
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let name = name.to_ascii_lowercase();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Root,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Owned node tree not yet attached to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    Element {
        element: Element,
        children: Vec<FragmentNode>,
    },
    Text(String),
    Comment(String),
}

impl FragmentNode {
    pub fn element(element: Element) -> Self {
        FragmentNode::Element {
            element,
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        FragmentNode::Text(text.into())
    }

    /// Append a child. Ignored on text and comment nodes.
    pub fn with_child(mut self, child: FragmentNode) -> Self {
        if let FragmentNode::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        serialize::write_fragment(&mut out, self);
        out
    }

    pub(crate) fn children(&self) -> &[FragmentNode] {
        match self {
            FragmentNode::Element { children, .. } => children.as_slice(),
            _ => &[],
        }
    }

    fn node_data(&self) -> NodeData {
        match self {
            FragmentNode::Element { element, .. } => NodeData::Element(element.clone()),
            FragmentNode::Text(text) => NodeData::Text(text.clone()),
            FragmentNode::Comment(text) => NodeData::Comment(text.clone()),
        }
    }
}

impl Drop for FragmentNode {
    fn drop(&mut self) {
        let FragmentNode::Element { children, .. } = self else {
            return;
        };
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let FragmentNode::Element { children, .. } = &mut node {
                pending.append(children);
            }
        }
    }
}

/// Arena-backed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                data: NodeData::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Parse an HTML string into a new document.
    ///
    /// Elements nested deeper than [`MAX_NESTING_DEPTH`] are unwrapped and
    /// their content kept in place.
    pub fn parse(html: &str) -> Self {
        let mut doc = Self::new();
        let root = doc.root();
        parse::read_into(&mut doc, root, html);
        doc
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slot(id).map(|s| &s.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id) {
            Some(NodeData::Element(element)) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root() {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Insert a fragment as the `index`-th child of `parent`.
    ///
    /// `index` is clamped to the child count. Returns the id of the fragment's
    /// top node.
    pub fn insert_fragment(&mut self, parent: NodeId, index: usize, fragment: &FragmentNode) -> NodeId {
        let id = self.build(fragment);
        self.attach(parent, index, id);
        id
    }

    pub fn append_fragment(&mut self, parent: NodeId, fragment: &FragmentNode) -> NodeId {
        let index = self.children(parent).len();
        self.insert_fragment(parent, index, fragment)
    }

    fn build(&mut self, fragment: &FragmentNode) -> NodeId {
        let top = self.push_slot(fragment.node_data());
        let mut pending: Vec<(NodeId, &FragmentNode)> =
            fragment.children().iter().rev().map(|c| (top, c)).collect();
        while let Some((parent, node)) = pending.pop() {
            let id = self.append_node(parent, node.node_data());
            pending.extend(node.children().iter().rev().map(|c| (id, c)));
        }
        top
    }

    fn push_slot(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a node as the last child of `parent`.
    fn append_node(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.push_slot(data);
        self.attach(parent, usize::MAX, id);
        id
    }

    fn attach(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if let Some(slot) = self.slots.get_mut(parent.0) {
            let index = index.min(slot.children.len());
            slot.children.insert(index, child);
        }
        if let Some(slot) = self.slots.get_mut(child.0) {
            slot.parent = Some(parent);
        }
    }

    /// Position of a node among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|c| *c == id)?;
        Some((parent, index))
    }

    /// Detach a node (and its subtree) from the document.
    ///
    /// Returns false for the root or an already detached node.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root() || !self.is_attached(id) {
            return false;
        }
        let Some((parent, index)) = self.index_in_parent(id) else {
            return false;
        };
        if let Some(slot) = self.slots.get_mut(parent.0) {
            slot.children.remove(index);
        }
        if let Some(slot) = self.slots.get_mut(id.0) {
            slot.parent = None;
        }
        true
    }

    /// Nearest element, starting at `id` itself, that carries `class`.
    pub fn closest_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.element(node).is_some_and(|e| e.has_class(class)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Attached nodes in document order, excluding the root.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(self.root()).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// First attached element with the given tag, in document order.
    pub fn find_tag(&self, tag: &str) -> Option<NodeId> {
        self.descendants()
            .into_iter()
            .find(|id| self.element(*id).is_some_and(|e| e.tag().eq_ignore_ascii_case(tag)))
    }

    /// First attached element with the given id attribute.
    pub fn find_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants()
            .into_iter()
            .find(|id| self.element(*id).and_then(Element::id) == Some(element_id))
    }

    /// Serialize the whole document body.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        serialize::write_node(&mut out, self, self.root());
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_serialize_preserve_structure() {
        let html = r#"<p>Hello <strong>world</strong></p><img src="https://cdn.example.com/a.png">"#;
        let doc = Document::parse(html);
        assert_eq!(doc.to_html(), html);
    }

    #[test]
    fn remove_detaches_subtree() {
        let mut doc = Document::parse(r#"<div class="video-wrapper" id="v1"><video id="v1"></video></div><p>after</p>"#);
        let video = doc.find_tag("video").unwrap();
        let wrapper = doc.closest_with_class(video, "video-wrapper").unwrap();

        assert!(doc.remove(wrapper));
        assert!(!doc.is_attached(video));
        assert_eq!(doc.to_html(), "<p>after</p>");
        assert!(!doc.remove(wrapper), "second remove is a no-op");
        assert!(!doc.remove(doc.root()));
    }

    #[test]
    fn closest_includes_self() {
        let doc = Document::parse(r#"<div class="a video-wrapper"><span>x</span></div>"#);
        let div = doc.find_tag("div").unwrap();
        assert_eq!(doc.closest_with_class(div, "video-wrapper"), Some(div));
        let span = doc.find_tag("span").unwrap();
        assert_eq!(doc.closest_with_class(span, "video-wrapper"), Some(div));
        assert_eq!(doc.closest_with_class(span, "missing"), None);
    }

    #[test]
    fn insert_fragment_clamps_index() {
        let mut doc = Document::parse("<p>one</p>");
        let root = doc.root();
        let frag = FragmentNode::element(Element::new("P")).with_child(FragmentNode::text("two"));
        let id = doc.insert_fragment(root, 99, &frag);
        assert_eq!(doc.index_in_parent(id), Some((root, 1)));
        assert_eq!(doc.to_html(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn deep_trees_build_serialize_and_drop() {
        const DEPTH: usize = 100_000;

        let mut fragment = FragmentNode::text("x");
        for _ in 0..DEPTH {
            fragment = FragmentNode::element(Element::new("div")).with_child(fragment);
        }
        let mut doc = Document::new();
        let root = doc.root();
        let top = doc.append_fragment(root, &fragment);
        drop(fragment);

        let html = doc.to_html();
        assert_eq!(html.matches("<div>").count(), DEPTH);
        assert!(html.contains("<div>x</div>"));
        assert_eq!(doc.descendants().len(), DEPTH + 1);

        assert!(doc.remove(top));
        assert_eq!(doc.to_html(), "");
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut element = Element::new("video").with_attr("SRC", "a").with_attr("id", "x");
        element.set_attr("src", "b");
        assert_eq!(element.attributes()[0], ("src".to_string(), "b".to_string()));
        assert_eq!(element.id(), Some("x"));
    }
}

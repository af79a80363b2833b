//! Headless editing surface over the in-memory document model.
//!
//! Used by hosts that run the coordinator without a browser engine and by
//! the test suite. Handles carry the document generation, so handles taken
//! before a [`load`](EditorSurface::load) never resolve against the new
//! document.

use tracing::trace;

use super::{EditorSurface, NodeHandle, Notice, SelectedNode, ToolbarButton};
use crate::dialog::DialogSpec;
use crate::dom::{Document, FragmentNode, NodeData, NodeId, is_void_element};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    /// A whole node is selected (e.g. a clicked image).
    Node(NodeId),
    /// Collapsed caret before the `index`-th child of `parent`.
    Caret { parent: NodeId, index: usize },
}

/// Modal currently shown by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub title: String,
    pub accept: String,
    /// Progress message while input is blocked.
    pub blocked: Option<String>,
}

/// In-memory [`EditorSurface`].
#[derive(Debug, Default)]
pub struct MemoryEditor {
    document: Document,
    generation: u32,
    selection: Option<Selection>,
    read_only: bool,
    buttons: Vec<ToolbarButton>,
    dialog: Option<DialogView>,
    notices: Vec<Notice>,
}

impl MemoryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(html: &str) -> Self {
        let mut editor = Self::new();
        editor.load(html);
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn handle(&self, id: NodeId) -> NodeHandle {
        NodeHandle::new((u64::from(self.generation) << 32) | id.index() as u64)
    }

    fn resolve(&self, handle: NodeHandle) -> Option<NodeId> {
        let raw = handle.raw();
        if (raw >> 32) as u32 != self.generation {
            return None;
        }
        let index = (raw & u64::from(u32::MAX)) as usize;
        self.document
            .descendants()
            .into_iter()
            .find(|id| id.index() == index)
    }

    /// Select a whole node.
    pub fn select(&mut self, id: NodeId) -> bool {
        if id == self.document.root() || !self.document.is_attached(id) {
            return false;
        }
        self.selection = Some(Selection::Node(id));
        true
    }

    /// Select the first element with the given DOM id.
    pub fn select_by_id(&mut self, element_id: &str) -> bool {
        match self.document.find_by_id(element_id) {
            Some(id) => self.select(id),
            None => false,
        }
    }

    /// Select the first element with the given tag.
    pub fn select_tag(&mut self, tag: &str) -> bool {
        match self.document.find_tag(tag) {
            Some(id) => self.select(id),
            None => false,
        }
    }

    /// Put a collapsed caret at the end of the document.
    pub fn place_caret_at_end(&mut self) {
        let root = self.document.root();
        self.selection = Some(Selection::Caret {
            parent: root,
            index: self.document.children(root).len(),
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Type text at the selection, as a user would.
    ///
    /// Returns false, leaving the document untouched, while read-only.
    pub fn type_text(&mut self, text: &str) -> bool {
        if self.read_only {
            return false;
        }
        let fragment = FragmentNode::text(text);
        let root = self.document.root();
        let (parent, index) = match self.selection {
            Some(Selection::Node(id)) => match self.document.element(id) {
                Some(element) if !is_void_element(element.tag()) => {
                    (id, self.document.children(id).len())
                }
                _ => self
                    .document
                    .index_in_parent(id)
                    .map(|(p, i)| (p, i + 1))
                    .unwrap_or((root, usize::MAX)),
            },
            Some(Selection::Caret { parent, index }) if self.document.is_attached(parent) => {
                (parent, index)
            }
            _ => (root, usize::MAX),
        };
        let id = self.document.insert_fragment(parent, index, &fragment);
        if let Some((parent, index)) = self.document.index_in_parent(id) {
            self.selection = Some(Selection::Caret {
                parent,
                index: index + 1,
            });
        }
        true
    }

    pub fn buttons(&self) -> &[ToolbarButton] {
        &self.buttons
    }

    pub fn dialog(&self) -> Option<&DialogView> {
        self.dialog.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }
}

impl EditorSurface for MemoryEditor {
    fn load(&mut self, html: &str) {
        self.document = Document::parse(html);
        self.generation = self.generation.wrapping_add(1);
        self.selection = None;
    }

    fn selected_node(&self) -> Option<SelectedNode> {
        let id = match self.selection? {
            Selection::Node(id) => id,
            Selection::Caret { parent, .. } => parent,
        };
        if !self.document.is_attached(id) {
            return None;
        }
        match self.document.data(id)? {
            NodeData::Element(element) => Some(SelectedNode::new(
                self.handle(id),
                element.tag(),
                element.attributes().to_vec(),
            )),
            _ => None,
        }
    }

    fn closest_with_class(&self, node: NodeHandle, class: &str) -> Option<NodeHandle> {
        let id = self.resolve(node)?;
        self.document
            .closest_with_class(id, class)
            .map(|found| self.handle(found))
    }

    fn remove_node(&mut self, node: NodeHandle) -> bool {
        let Some(id) = self.resolve(node) else {
            return false;
        };
        let position = self.document.index_in_parent(id);
        if !self.document.remove(id) {
            return false;
        }
        let selection_gone = match self.selection {
            Some(Selection::Node(sel)) | Some(Selection::Caret { parent: sel, .. }) => {
                !self.document.is_attached(sel)
            }
            None => false,
        };
        if selection_gone {
            self.selection = position.map(|(parent, index)| Selection::Caret { parent, index });
        }
        trace!(node = id.index(), "node removed");
        true
    }

    fn replace_selection(&mut self, fragment: &FragmentNode) {
        let root = self.document.root();
        let target = match self.selection {
            Some(Selection::Node(id)) if self.document.is_attached(id) => {
                let position = self.document.index_in_parent(id);
                self.document.remove(id);
                position
            }
            Some(Selection::Caret { parent, index }) if self.document.is_attached(parent) => {
                Some((parent, index))
            }
            _ => None,
        };
        let (parent, index) = target.unwrap_or((root, usize::MAX));
        let inserted = self.document.insert_fragment(parent, index, fragment);
        self.selection = Some(Selection::Node(inserted));
    }

    fn serialize(&self) -> String {
        self.document.to_html()
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn register_action(&mut self, button: ToolbarButton) {
        if !self.buttons.iter().any(|b| b.name == button.name) {
            self.buttons.push(button);
        }
    }

    fn open_dialog(&mut self, spec: &DialogSpec) {
        self.dialog = Some(DialogView {
            title: spec.title.to_string(),
            accept: spec.accept.to_string(),
            blocked: None,
        });
    }

    fn block_dialog(&mut self, message: &str) {
        if let Some(dialog) = &mut self.dialog {
            dialog.blocked = Some(message.to_string());
        }
    }

    fn unblock_dialog(&mut self) {
        if let Some(dialog) = &mut self.dialog {
            dialog.blocked = None;
        }
    }

    fn close_dialog(&mut self) {
        self.dialog = None;
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

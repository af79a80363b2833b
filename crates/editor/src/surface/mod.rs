//! Editing surface contract.
//!
//! The rich-text engine is a black box to the coordinator. This trait is
//! the part of it the coordinator needs: read the selection, replace it
//! with markup, remove nodes, serialize, toggle read-only, register toolbar
//! actions, and drive the insert-video modal.

mod memory;

use std::fmt;

use crate::dialog::DialogSpec;
use crate::dom::FragmentNode;

pub use memory::{DialogView, MemoryEditor};

/// Opaque reference to a node inside the surface's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Snapshot of the currently selected node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedNode {
    pub handle: NodeHandle,
    /// Lowercased tag name.
    pub tag: String,
    /// DOM id, if any.
    pub id: Option<String>,
    attributes: Vec<(String, String)>,
}

impl SelectedNode {
    pub fn new(handle: NodeHandle, tag: &str, attributes: Vec<(String, String)>) -> Self {
        let id = attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("id"))
            .map(|(_, value)| value.clone());
        Self {
            handle,
            tag: tag.to_ascii_lowercase(),
            id,
            attributes,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Toolbar actions the coordinator contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaAction {
    InsertVideo,
    DeleteImage,
    DeleteVideo,
}

impl MediaAction {
    pub const ALL: [MediaAction; 3] = [
        MediaAction::InsertVideo,
        MediaAction::DeleteImage,
        MediaAction::DeleteVideo,
    ];

    /// Toolbar button name, as referenced from the toolbar layout string.
    pub fn button_name(self) -> &'static str {
        match self {
            MediaAction::InsertVideo => "videoUpload",
            MediaAction::DeleteImage => "deleteImage",
            MediaAction::DeleteVideo => "deleteVideo",
        }
    }

    pub fn from_button_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.button_name() == name)
    }

    pub fn button(self) -> ToolbarButton {
        let text = match self {
            MediaAction::InsertVideo => "Upload Video",
            MediaAction::DeleteImage => "Delete Image",
            MediaAction::DeleteVideo => "Delete Video",
        };
        ToolbarButton {
            action: self,
            name: self.button_name(),
            text,
            title: text,
        }
    }
}

impl fmt::Display for MediaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.button_name())
    }
}

/// Button registered with the surface's toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarButton {
    pub action: MediaAction,
    pub name: &'static str,
    pub text: &'static str,
    pub title: &'static str,
}

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Error,
}

/// Transient message shown by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// The editing engine as seen by the coordinator.
pub trait EditorSurface: Send {
    /// Replace the whole document.
    fn load(&mut self, html: &str);

    /// Current selection, if the caret is on or inside a node.
    fn selected_node(&self) -> Option<SelectedNode>;

    /// Nearest ancestor of `node`, itself included, carrying `class`.
    fn closest_with_class(&self, node: NodeHandle, class: &str) -> Option<NodeHandle>;

    /// Remove a node and its subtree. Returns false if it was already gone.
    fn remove_node(&mut self, node: NodeHandle) -> bool;

    /// Replace the current selection with a fragment.
    fn replace_selection(&mut self, fragment: &FragmentNode);

    /// Serialize the full document.
    fn serialize(&self) -> String;

    fn set_read_only(&mut self, read_only: bool);

    fn is_read_only(&self) -> bool;

    /// Register a toolbar button for one of the coordinator's actions.
    fn register_action(&mut self, button: ToolbarButton);

    fn open_dialog(&mut self, spec: &DialogSpec);

    /// Block dialog input behind a progress message.
    fn block_dialog(&mut self, message: &str);

    fn unblock_dialog(&mut self);

    fn close_dialog(&mut self);

    fn notify(&mut self, notice: Notice);
}

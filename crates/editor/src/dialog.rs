//! Insert-video dialog controller.
//!
//! `Closed -> Open -> Submitting -> Closed`, or `Open -> Closed` on cancel.
//! The controller only tracks state and the selected files; the surface
//! renders the modal described by [`DialogSpec`].

use std::fmt;

use tracing::debug;

use crate::error::{EditorError, EditorResult};
use crate::gateway::MediaFile;

/// Static description of the insert-video modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogSpec {
    pub title: &'static str,
    /// Accept filter for the file input.
    pub accept: &'static str,
    pub cancel_label: &'static str,
    pub submit_label: &'static str,
    /// Message shown while the upload blocks the dialog.
    pub uploading_message: &'static str,
}

pub const INSERT_VIDEO_DIALOG: DialogSpec = DialogSpec {
    title: "Insert a video",
    accept: "video/*",
    cancel_label: "Cancel",
    submit_label: "Insert",
    uploading_message: "uploading ...",
};

/// Where the dialog is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open,
    Submitting,
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DialogState::Closed => "closed",
            DialogState::Open => "open",
            DialogState::Submitting => "submitting",
        })
    }
}

/// Video dialog state machine.
#[derive(Debug)]
pub struct DialogController {
    state: DialogState,
    files: Vec<MediaFile>,
}

impl Default for DialogController {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogController {
    pub fn new() -> Self {
        Self {
            state: DialogState::Closed,
            files: Vec::new(),
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn selected_files(&self) -> &[MediaFile] {
        &self.files
    }

    fn invalid(&self, action: &'static str) -> EditorError {
        EditorError::Dialog {
            state: self.state,
            action,
        }
    }

    /// Open the dialog. Reopening an open dialog keeps it as is.
    pub fn open(&mut self) -> EditorResult<()> {
        match self.state {
            DialogState::Closed => {
                self.state = DialogState::Open;
                self.files.clear();
                debug!("video dialog opened");
                Ok(())
            }
            DialogState::Open => Ok(()),
            DialogState::Submitting => Err(self.invalid("open")),
        }
    }

    /// Replace the file input's selection.
    pub fn select_files(&mut self, files: Vec<MediaFile>) -> EditorResult<()> {
        if self.state != DialogState::Open {
            return Err(self.invalid("select files"));
        }
        debug!(count = files.len(), "video files selected");
        self.files = files;
        Ok(())
    }

    /// Cancel an open dialog. Cancelling a closed dialog is a no-op.
    pub fn cancel(&mut self) -> EditorResult<()> {
        match self.state {
            DialogState::Open => {
                self.close();
                debug!("video dialog cancelled");
                Ok(())
            }
            DialogState::Closed => Ok(()),
            DialogState::Submitting => Err(self.invalid("cancel")),
        }
    }

    /// Submit the dialog.
    ///
    /// Returns the selected files and moves to `Submitting`, or closes the
    /// dialog and returns `None` when nothing was selected.
    pub fn begin_submit(&mut self) -> EditorResult<Option<Vec<MediaFile>>> {
        if self.state != DialogState::Open {
            return Err(self.invalid("submit"));
        }
        if self.files.is_empty() {
            self.close();
            debug!("video dialog submitted without a file");
            return Ok(None);
        }
        self.state = DialogState::Submitting;
        Ok(Some(std::mem::take(&mut self.files)))
    }

    /// Close after a submission settled, whatever its result.
    pub fn finish_submit(&mut self) {
        if self.state == DialogState::Submitting {
            self.close();
        }
    }

    fn close(&mut self) {
        self.state = DialogState::Closed;
        self.files.clear();
    }
}

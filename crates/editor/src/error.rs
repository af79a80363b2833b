//! Editor error types.

use std::time::Duration;

use thiserror::Error;

use crate::dialog::DialogState;
use crate::gateway::AssetKind;

/// Errors surfaced by an editor session.
///
/// Ineligible delete targets are not errors; they come back as
/// [`DeleteOutcome::Ignored`](crate::session::DeleteOutcome::Ignored).
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("{kind} upload failed")]
    UploadFailed {
        kind: AssetKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("{kind} delete failed for asset {asset_id}")]
    DeleteFailed {
        kind: AssetKind,
        asset_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("cannot {action} while dialog is {state}")]
    Dialog {
        state: DialogState,
        action: &'static str,
    },
}

impl EditorError {
    /// True for gateway upload rejections and upload timeouts.
    pub fn is_upload_failure(&self) -> bool {
        match self {
            EditorError::UploadFailed { .. } => true,
            EditorError::Timeout { operation, .. } => operation.starts_with("upload"),
            _ => false,
        }
    }

    /// True for gateway delete rejections and delete timeouts.
    pub fn is_delete_failure(&self) -> bool {
        match self {
            EditorError::DeleteFailed { .. } => true,
            EditorError::Timeout { operation, .. } => operation.starts_with("delete"),
            _ => false,
        }
    }
}

/// Result type alias using EditorError.
pub type EditorResult<T> = Result<T, EditorError>;

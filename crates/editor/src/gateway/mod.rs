//! Asset gateway: backend upload/delete operations for embedded media.
//!
//! The coordinator never talks to storage directly. Every upload and delete
//! goes through an [`AssetGateway`], keyed by the caller's [`ContentId`].
//! All four operations have no-op defaults, so a gateway only needs to
//! implement the operations its host actually supports.

pub mod callback;
pub mod http;
pub mod storage;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use callback::CallbackGateway;
pub use http::{FILE_NAME_HEADER, HttpGateway};
pub use storage::StorageGateway;

/// Opaque identifier of the document that owns the media.
///
/// Passed through to every gateway call and never interpreted by the
/// coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ContentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of embedded media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        }
    }

    /// Collection name used in URL paths and storage directories.
    pub fn collection(&self) -> &'static str {
        match self {
            AssetKind::Image => "images",
            AssetKind::Video => "videos",
        }
    }

    /// MIME top-level type accepted for this kind.
    pub fn mime_prefix(&self) -> &'static str {
        match self {
            AssetKind::Image => "image/",
            AssetKind::Video => "video/",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file handed to the gateway for upload.
///
/// Images arrive one at a time from the engine's upload hook; videos arrive
/// as the file list collected by the insert dialog.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// One uploaded asset as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub id: String,
    pub url: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

impl UploadedAsset {
    pub fn new(id: impl Into<String>, url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            file_name: file_name.into(),
        }
    }
}

/// Ordered upload results, one per uploaded file.
pub type UploadResult = Vec<UploadedAsset>;

/// Backend contract for media uploads and deletes.
///
/// Every default method is a no-op that resolves immediately, matching a
/// host that did not supply the corresponding operation.
#[async_trait]
pub trait AssetGateway: Send + Sync {
    /// Upload a single image; only the first result's URL is used.
    async fn upload_image(
        &self,
        _file: MediaFile,
        _content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        Ok(Vec::new())
    }

    /// Delete a previously uploaded image.
    async fn delete_image(&self, _asset_id: &str, _content_id: Option<&ContentId>) -> Result<()> {
        Ok(())
    }

    /// Upload a list of video files; only the first result is used.
    async fn upload_video(
        &self,
        _files: Vec<MediaFile>,
        _content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        Ok(Vec::new())
    }

    /// Delete a previously uploaded video.
    async fn delete_video(&self, _asset_id: &str, _content_id: Option<&ContentId>) -> Result<()> {
        Ok(())
    }
}

/// Gateway with every operation left at its no-op default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGateway;

#[async_trait]
impl AssetGateway for NoopGateway {}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_gateway_resolves_cleanly() {
        let gateway = NoopGateway;
        let file = MediaFile::new("a.png", "image/png", vec![1, 2, 3]);
        assert!(gateway.upload_image(file.clone(), None).await.unwrap().is_empty());
        assert!(gateway.upload_video(vec![file], None).await.unwrap().is_empty());
        gateway.delete_image("x.png", None).await.unwrap();
        gateway
            .delete_video("v1", Some(&ContentId::from("doc-1")))
            .await
            .unwrap();
    }

    #[test]
    fn uploaded_asset_uses_camel_case_file_name() {
        let json = r#"[{"id":"v1","url":"https://x/v1.mp4","fileName":"a.mp4"}]"#;
        let assets: UploadResult = serde_json::from_str(json).unwrap();
        assert_eq!(assets[0], UploadedAsset::new("v1", "https://x/v1.mp4", "a.mp4"));

        let back = serde_json::to_string(&assets[0]).unwrap();
        assert!(back.contains("\"fileName\":\"a.mp4\""));
    }

    #[test]
    fn media_file_debug_hides_payload() {
        let file = MediaFile::new("a.mp4", "video/mp4", vec![0; 2048]);
        let debug = format!("{file:?}");
        assert!(debug.contains("size: 2048"));
        assert!(!debug.contains("[0, 0"));
    }
}

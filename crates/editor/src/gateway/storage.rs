//! Gateway that stores media directly in an [`AssetStore`].
//!
//! Assets live at `{content}/{collection}/{asset_id}` where the asset id is a
//! v7 UUID plus the file extension. The asset id is therefore the trailing
//! segment of the public URL, which is what the image delete handler extracts.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AssetGateway, AssetKind, ContentId, MediaFile, UploadResult, UploadedAsset};
use crate::storage::{AssetPath, AssetStore, safe_segment};

/// Maximum image size (10 MB).
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Maximum video size (200 MB).
pub const MAX_VIDEO_SIZE: usize = 200 * 1024 * 1024;

/// Store-backed asset gateway.
#[derive(Debug, Clone)]
pub struct StorageGateway {
    store: Arc<dyn AssetStore>,
}

impl StorageGateway {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    async fn save(
        &self,
        kind: AssetKind,
        file: &MediaFile,
        content_id: Option<&ContentId>,
    ) -> Result<UploadedAsset> {
        let max_size = match kind {
            AssetKind::Image => MAX_IMAGE_SIZE,
            AssetKind::Video => MAX_VIDEO_SIZE,
        };
        if file.size() > max_size {
            bail!(
                "file too large: {} bytes (max {} bytes)",
                file.size(),
                max_size
            );
        }

        let mime_type = detect_mime(file);
        if !mime_type.starts_with(kind.mime_prefix()) {
            bail!("file type not allowed for {kind}: {mime_type}");
        }

        let asset_id = match extension_for(file) {
            Some(ext) => format!("{}.{ext}", Uuid::now_v7().simple()),
            None => Uuid::now_v7().simple().to_string(),
        };
        let path = AssetPath::new(kind, &asset_id, content_id)?;

        self.store
            .put(&path, &file.data)
            .await
            .context("failed to write asset")?;

        debug!(
            asset_id = %asset_id,
            kind = %kind,
            filename = %file.file_name,
            size = file.size(),
            "asset stored"
        );

        Ok(UploadedAsset {
            url: self.store.public_url(&path),
            id: asset_id,
            file_name: file.file_name.clone(),
        })
    }

    async fn remove(
        &self,
        kind: AssetKind,
        asset_id: &str,
        content_id: Option<&ContentId>,
    ) -> Result<()> {
        let path = AssetPath::new(kind, asset_id, content_id)?;
        self.store
            .remove(&path)
            .await
            .context("failed to remove asset")?;
        info!(asset_id = %asset_id, kind = %kind, "asset removed");
        Ok(())
    }
}

/// Sniff the MIME type from magic bytes, falling back to the declared type.
fn detect_mime(file: &MediaFile) -> String {
    infer::get(&file.data)
        .map(|t| t.mime_type().to_string())
        .unwrap_or_else(|| file.mime_type.to_ascii_lowercase())
}

fn extension_for(file: &MediaFile) -> Option<String> {
    let safe = safe_segment(&file.file_name);
    safe.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .or_else(|| infer::get(&file.data).map(|t| t.extension().to_string()))
}

#[async_trait]
impl AssetGateway for StorageGateway {
    async fn upload_image(
        &self,
        file: MediaFile,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        Ok(vec![self.save(AssetKind::Image, &file, content_id).await?])
    }

    async fn delete_image(&self, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        self.remove(AssetKind::Image, asset_id, content_id).await
    }

    async fn upload_video(
        &self,
        files: Vec<MediaFile>,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        let mut uploaded = Vec::with_capacity(files.len());
        for file in &files {
            uploaded.push(self.save(AssetKind::Video, file, content_id).await?);
        }
        Ok(uploaded)
    }

    async fn delete_video(&self, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        self.remove(AssetKind::Video, asset_id, content_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::storage::LocalAssetStore;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn gateway(dir: &std::path::Path) -> StorageGateway {
        StorageGateway::new(Arc::new(LocalAssetStore::new(
            dir,
            "https://cdn.example.com/files",
        )))
    }

    #[tokio::test]
    async fn image_upload_url_ends_with_asset_id() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(dir.path());
        let id = ContentId::from("doc-1");

        let result = gateway
            .upload_image(MediaFile::new("Photo 1.PNG", "image/png", PNG_HEADER.to_vec()), Some(&id))
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        let asset = &result[0];
        assert!(asset.id.ends_with(".png"));
        assert_eq!(asset.url.rsplit('/').next(), Some(asset.id.as_str()));
        assert!(asset.url.starts_with("https://cdn.example.com/files/doc-1/images/"));
        assert_eq!(asset.file_name, "Photo 1.PNG");

        let file = dir.path().join("doc-1").join("images").join(&asset.id);
        assert!(file.exists());

        gateway.delete_image(&asset.id, Some(&id)).await.unwrap();
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn sniffed_type_must_match_kind() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(dir.path());

        // PNG bytes declared as video are rejected.
        let err = gateway
            .upload_video(vec![MediaFile::new("a.mp4", "video/mp4", PNG_HEADER.to_vec())], None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[tokio::test]
    async fn declared_type_used_when_bytes_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(dir.path());

        let result = gateway
            .upload_video(
                vec![
                    MediaFile::new("a.mp4", "video/mp4", b"not-a-real-container".to_vec()),
                    MediaFile::new("b.webm", "video/webm", b"also-opaque".to_vec()),
                ],
                None,
            )
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert!(result[0].url.contains("/unassigned/videos/"));
        assert_eq!(result[1].file_name, "b.webm");
    }

    #[tokio::test]
    async fn delete_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(dir.path());
        assert!(gateway.delete_video("../../etc/passwd", None).await.is_err());
        assert!(gateway.delete_video("..", None).await.is_err());
        // Unknown but well-formed ids are a no-op.
        gateway.delete_video("0192abc.mp4", None).await.unwrap();
    }

    #[tokio::test]
    async fn oversized_image_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = gateway(dir.path());
        let mut data = PNG_HEADER.to_vec();
        data.resize(MAX_IMAGE_SIZE + 1, 0);
        let err = gateway
            .upload_image(MediaFile::new("big.png", "image/png", data), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}

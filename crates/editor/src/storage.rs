//! Asset stores for uploaded media.
//!
//! Stores address assets by [`AssetPath`]: a content directory, the kind's
//! collection and the asset id. Every segment is validated when the path is
//! built, so a store never sees a traversal.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::gateway::{AssetKind, ContentId};

/// Directory used when the host did not supply a content id.
pub const UNASSIGNED_CONTENT_DIR: &str = "unassigned";

/// Validated location of one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    content_dir: String,
    kind: AssetKind,
    asset_id: String,
}

impl AssetPath {
    /// Build the path of an asset.
    ///
    /// Fails unless `asset_id` is already a plain file name. The content id
    /// is reduced to a safe segment, falling back to
    /// [`UNASSIGNED_CONTENT_DIR`].
    pub fn new(kind: AssetKind, asset_id: &str, content_id: Option<&ContentId>) -> Result<Self> {
        if !is_plain_segment(asset_id) || safe_segment(asset_id) != asset_id {
            bail!("invalid asset id: {asset_id}");
        }
        let content_dir = content_id
            .map(|id| safe_segment(id.as_str()))
            .filter(|dir| is_plain_segment(dir))
            .unwrap_or_else(|| UNASSIGNED_CONTENT_DIR.to_string());
        Ok(Self {
            content_dir,
            kind,
            asset_id: asset_id.to_string(),
        })
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn content_dir(&self) -> &str {
        &self.content_dir
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.content_dir,
            self.kind.collection(),
            self.asset_id
        )
    }
}

/// Backend holding asset bytes.
#[async_trait]
pub trait AssetStore: Send + Sync + fmt::Debug {
    async fn put(&self, path: &AssetPath, data: &[u8]) -> Result<()>;

    /// Remove an asset. Removing a missing asset succeeds.
    async fn remove(&self, path: &AssetPath) -> Result<()>;

    /// URL the asset is served from. Its last segment is the asset id.
    fn public_url(&self, path: &AssetPath) -> String;
}

/// Assets on the local filesystem under `root`, served from `base_url`.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
    base_url: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    /// Filesystem location of an asset.
    pub fn file_path(&self, path: &AssetPath) -> PathBuf {
        self.root
            .join(path.content_dir())
            .join(path.kind().collection())
            .join(path.asset_id())
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(&self, path: &AssetPath, data: &[u8]) -> Result<()> {
        let file = self.file_path(path);
        if let Some(dir) = file.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        fs::write(&file, data)
            .await
            .with_context(|| format!("failed to write {path}"))?;
        debug!(asset = %path, size = data.len(), "asset written");
        Ok(())
    }

    async fn remove(&self, path: &AssetPath) -> Result<()> {
        match fs::remove_file(self.file_path(path)).await {
            Ok(()) => {
                debug!(asset = %path, "asset file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(asset = %path, "asset file already gone");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("failed to remove {path}")),
        }
    }

    fn public_url(&self, path: &AssetPath) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".."
}

/// Reduce a name to one safe path segment.
///
/// Keeps the last `/` or `\` separated component and replaces anything
/// outside `[A-Za-z0-9._-]` with `_`.
pub fn safe_segment(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    last.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(200)
        .collect()
}

//! Gateway that talks to a remote asset API over HTTP.
//!
//! - `POST {base}/images` and `POST {base}/videos` take the raw file body with
//!   its name in the `x-file-name` header and answer with a JSON array of
//!   `{id, url, fileName}`. Videos are sent one request per file.
//! - `DELETE {base}/images/{id}` and `DELETE {base}/videos/{id}`.
//!
//! The content id travels as the `content_id` query parameter.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use super::{AssetGateway, AssetKind, ContentId, MediaFile, UploadResult};

/// Header carrying the original file name on upload.
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Default request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP asset gateway.
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    /// Create a gateway for the API rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid asset API URL")?;
        if !matches!(base_url.scheme(), "http" | "https") {
            anyhow::bail!("asset API URL must use http or https");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, kind: AssetKind, asset_id: Option<&str>, content_id: Option<&ContentId>) -> String {
        let mut endpoint = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            kind.collection()
        );
        if let Some(id) = asset_id {
            endpoint.push('/');
            endpoint.push_str(&urlencoding::encode(id));
        }
        if let Some(content_id) = content_id {
            endpoint.push_str("?content_id=");
            endpoint.push_str(&urlencoding::encode(content_id.as_str()));
        }
        endpoint
    }

    async fn post(
        &self,
        kind: AssetKind,
        file: MediaFile,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        let url = self.endpoint(kind, None, content_id);
        let size = file.size();
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, file.mime_type.as_str())
            .header(FILE_NAME_HEADER, urlencoding::encode(&file.file_name).into_owned())
            .body(file.data)
            .send()
            .await
            .with_context(|| format!("upload request to {url} failed"))?
            .error_for_status()
            .context("asset API rejected upload")?;

        let uploaded: UploadResult = response
            .json()
            .await
            .context("invalid upload response")?;
        debug!(url = %url, size, count = uploaded.len(), "upload acknowledged");
        Ok(uploaded)
    }

    async fn delete(&self, kind: AssetKind, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        let url = self.endpoint(kind, Some(asset_id), content_id);
        self.client
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("delete request to {url} failed"))?
            .error_for_status()
            .context("asset API rejected delete")?;
        debug!(url = %url, "delete acknowledged");
        Ok(())
    }
}

#[async_trait]
impl AssetGateway for HttpGateway {
    async fn upload_image(
        &self,
        file: MediaFile,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        self.post(AssetKind::Image, file, content_id).await
    }

    async fn delete_image(&self, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        self.delete(AssetKind::Image, asset_id, content_id).await
    }

    async fn upload_video(
        &self,
        files: Vec<MediaFile>,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            uploaded.extend(self.post(AssetKind::Video, file, content_id).await?);
        }
        Ok(uploaded)
    }

    async fn delete_video(&self, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        self.delete(AssetKind::Video, asset_id, content_id).await
    }
}

impl std::fmt::Debug for HttpGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGateway")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

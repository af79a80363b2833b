//! Gateway assembled from individual async callbacks.
//!
//! Hosts that expose their storage API as four loose functions register
//! only the ones they have. A missing callback falls back to the no-op
//! default of [`AssetGateway`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::{AssetGateway, ContentId, MediaFile, UploadResult};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type UploadImageFn = dyn Fn(MediaFile, Option<ContentId>) -> BoxFuture<Result<UploadResult>> + Send + Sync;
type UploadVideoFn =
    dyn Fn(Vec<MediaFile>, Option<ContentId>) -> BoxFuture<Result<UploadResult>> + Send + Sync;
type DeleteFn = dyn Fn(String, Option<ContentId>) -> BoxFuture<Result<()>> + Send + Sync;

/// Gateway backed by optional per-operation closures.
#[derive(Clone, Default)]
pub struct CallbackGateway {
    upload_image: Option<Arc<UploadImageFn>>,
    delete_image: Option<Arc<DeleteFn>>,
    upload_video: Option<Arc<UploadVideoFn>>,
    delete_video: Option<Arc<DeleteFn>>,
}

impl CallbackGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_upload_image<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(MediaFile, Option<ContentId>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<UploadResult>> + Send + 'static,
    {
        let callback: Arc<UploadImageFn> = Arc::new(
            move |file: MediaFile, id: Option<ContentId>| -> BoxFuture<Result<UploadResult>> {
                Box::pin(f(file, id))
            },
        );
        self.upload_image = Some(callback);
        self
    }

    pub fn on_delete_image<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String, Option<ContentId>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let callback: Arc<DeleteFn> =
            Arc::new(move |asset_id: String, id: Option<ContentId>| -> BoxFuture<Result<()>> {
                Box::pin(f(asset_id, id))
            });
        self.delete_image = Some(callback);
        self
    }

    pub fn on_upload_video<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Vec<MediaFile>, Option<ContentId>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<UploadResult>> + Send + 'static,
    {
        let callback: Arc<UploadVideoFn> = Arc::new(
            move |files: Vec<MediaFile>, id: Option<ContentId>| -> BoxFuture<Result<UploadResult>> {
                Box::pin(f(files, id))
            },
        );
        self.upload_video = Some(callback);
        self
    }

    pub fn on_delete_video<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(String, Option<ContentId>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let callback: Arc<DeleteFn> =
            Arc::new(move |asset_id: String, id: Option<ContentId>| -> BoxFuture<Result<()>> {
                Box::pin(f(asset_id, id))
            });
        self.delete_video = Some(callback);
        self
    }
}

#[async_trait]
impl AssetGateway for CallbackGateway {
    async fn upload_image(
        &self,
        file: MediaFile,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        match &self.upload_image {
            Some(f) => f(file, content_id.cloned()).await,
            None => Ok(Vec::new()),
        }
    }

    async fn delete_image(&self, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        match &self.delete_image {
            Some(f) => f(asset_id.to_string(), content_id.cloned()).await,
            None => Ok(()),
        }
    }

    async fn upload_video(
        &self,
        files: Vec<MediaFile>,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        match &self.upload_video {
            Some(f) => f(files, content_id.cloned()).await,
            None => Ok(Vec::new()),
        }
    }

    async fn delete_video(&self, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        match &self.delete_video {
            Some(f) => f(asset_id.to_string(), content_id.cloned()).await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for CallbackGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackGateway")
            .field("upload_image", &self.upload_image.is_some())
            .field("delete_image", &self.delete_image.is_some())
            .field("upload_video", &self.upload_video.is_some())
            .field("delete_video", &self.delete_video.is_some())
            .finish()
    }
}

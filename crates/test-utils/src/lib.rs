//! Trovato media editor test utilities.
//!
//! Helpers for integration testing: a recording asset gateway with
//! scripted responses, a recording content sink, media and document
//! fixtures, and assertion utilities for serialized markup.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use trovato_media_editor::gateway::{AssetGateway, ContentId, MediaFile, UploadResult};
use trovato_media_editor::sync::ContentSink;

/// Storage origin used by the document fixtures.
pub const STORAGE_ORIGIN: &str = "cdn.example.com";

/// A call observed by [`RecordingGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    UploadImage {
        file_name: String,
        content_id: Option<String>,
    },
    DeleteImage {
        asset_id: String,
        content_id: Option<String>,
    },
    UploadVideo {
        file_names: Vec<String>,
        content_id: Option<String>,
    },
    DeleteVideo {
        asset_id: String,
        content_id: Option<String>,
    },
}

impl GatewayCall {
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            GatewayCall::DeleteImage { .. } | GatewayCall::DeleteVideo { .. }
        )
    }
}

#[derive(Default)]
struct Script {
    image_uploads: VecDeque<Result<UploadResult, String>>,
    video_uploads: VecDeque<Result<UploadResult, String>>,
    delete_error: Option<String>,
}

/// Gateway that records every call and answers from a script.
///
/// Unscripted uploads return an empty result and unscripted deletes
/// succeed. A held gateway parks each call until [`release`] is called.
///
/// [`release`]: RecordingGateway::release
#[derive(Clone, Default)]
pub struct RecordingGateway {
    calls: Arc<Mutex<Vec<GatewayCall>>>,
    script: Arc<Mutex<Script>>,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park every call until released.
    pub fn held() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    /// Let `count` parked (or future) calls proceed.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Queue the result of the next image upload.
    pub fn respond_to_image(self, assets: UploadResult) -> Self {
        self.script.lock().image_uploads.push_back(Ok(assets));
        self
    }

    /// Queue the result of the next video upload.
    pub fn respond_to_video(self, assets: UploadResult) -> Self {
        self.script.lock().video_uploads.push_back(Ok(assets));
        self
    }

    /// Queue a rejection of the next image upload.
    pub fn reject_image_upload(self, message: &str) -> Self {
        self.script
            .lock()
            .image_uploads
            .push_back(Err(message.to_string()));
        self
    }

    /// Queue a rejection of the next video upload.
    pub fn reject_video_upload(self, message: &str) -> Self {
        self.script
            .lock()
            .video_uploads
            .push_back(Err(message.to_string()));
        self
    }

    /// Reject every delete.
    pub fn reject_deletes(self, message: &str) -> Self {
        self.script.lock().delete_error = Some(message.to_string());
        self
    }

    /// Snapshot of the calls made so far.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Yield until at least `count` calls have arrived.
    pub async fn wait_for_calls(&self, count: usize) {
        while self.call_count() < count {
            tokio::task::yield_now().await;
        }
    }

    async fn enter(&self, call: GatewayCall) {
        self.calls.lock().push(call);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }

    fn next_upload(queue: &mut VecDeque<Result<UploadResult, String>>) -> Result<UploadResult> {
        match queue.pop_front() {
            Some(Ok(assets)) => Ok(assets),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }

    fn delete_result(&self) -> Result<()> {
        match &self.script.lock().delete_error {
            Some(message) => Err(anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

fn owned(content_id: Option<&ContentId>) -> Option<String> {
    content_id.map(|id| id.as_str().to_string())
}

#[async_trait]
impl AssetGateway for RecordingGateway {
    async fn upload_image(
        &self,
        file: MediaFile,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        self.enter(GatewayCall::UploadImage {
            file_name: file.file_name.clone(),
            content_id: owned(content_id),
        })
        .await;
        Self::next_upload(&mut self.script.lock().image_uploads)
    }

    async fn delete_image(&self, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        self.enter(GatewayCall::DeleteImage {
            asset_id: asset_id.to_string(),
            content_id: owned(content_id),
        })
        .await;
        self.delete_result()
    }

    async fn upload_video(
        &self,
        files: Vec<MediaFile>,
        content_id: Option<&ContentId>,
    ) -> Result<UploadResult> {
        self.enter(GatewayCall::UploadVideo {
            file_names: files.iter().map(|f| f.file_name.clone()).collect(),
            content_id: owned(content_id),
        })
        .await;
        Self::next_upload(&mut self.script.lock().video_uploads)
    }

    async fn delete_video(&self, asset_id: &str, content_id: Option<&ContentId>) -> Result<()> {
        self.enter(GatewayCall::DeleteVideo {
            asset_id: asset_id.to_string(),
            content_id: owned(content_id),
        })
        .await;
        self.delete_result()
    }
}

/// Collects every document pushed to the owner.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pushes: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink to hand to the session options.
    pub fn sink(&self) -> impl ContentSink + 'static {
        let pushes = Arc::clone(&self.pushes);
        move |html: String| pushes.lock().push(html)
    }

    pub fn pushes(&self) -> Vec<String> {
        self.pushes.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.pushes.lock().len()
    }

    pub fn last(&self) -> Option<String> {
        self.pushes.lock().last().cloned()
    }
}

/// Media file fixtures.
pub mod media {
    use trovato_media_editor::gateway::{MediaFile, UploadedAsset};

    /// PNG signature followed by padding.
    pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    /// Minimal ISO base media header with an `isom` brand.
    pub const MP4_BYTES: &[u8] = &[
        0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0, 0, 0x02, 0, b'i', b's',
        b'o', b'm', b'm', b'p', b'4', b'1',
    ];

    pub fn png(name: &str) -> MediaFile {
        MediaFile::new(name, "image/png", PNG_BYTES.to_vec())
    }

    pub fn mp4(name: &str) -> MediaFile {
        MediaFile::new(name, "video/mp4", MP4_BYTES.to_vec())
    }

    /// Uploaded video asset as a backend would describe it.
    pub fn video_asset(id: &str, file_name: &str) -> UploadedAsset {
        UploadedAsset::new(id, format!("https://x/{id}.mp4"), file_name)
    }

    /// Uploaded image asset on the fixture storage origin.
    pub fn image_asset(id: &str) -> UploadedAsset {
        UploadedAsset::new(id, format!("https://{}/{id}", super::STORAGE_ORIGIN), id)
    }
}

/// Document fixtures.
pub mod docs {
    use super::STORAGE_ORIGIN;

    /// Paragraph, image from `src`, paragraph.
    pub fn with_image(src: &str) -> String {
        format!(r#"<p>before</p><img src="{src}" alt="pic"><p>after</p>"#)
    }

    /// Image hosted on the fixture storage origin.
    pub fn with_stored_image(asset_id: &str) -> String {
        with_image(&format!("https://{STORAGE_ORIGIN}/{asset_id}"))
    }

    /// Video container as inserted by the editor.
    pub fn with_video(asset_id: &str) -> String {
        format!(
            r#"<p>intro</p><div class="help-center-video-content video-wrapper" style="text-align:center" id="{asset_id}" data-container-id="{asset_id}"><video class="help-center-video" width="90%" height="240" controls src="https://x/{asset_id}.mp4" id="{asset_id}" data-filename="{asset_id}.mp4"></video></div><p>outro</p>"#
        )
    }
}

/// Assertion helpers for serialized markup.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{}'\nActual: {}",
            needle,
            haystack
        );
    }
}

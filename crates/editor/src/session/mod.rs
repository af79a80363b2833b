//! Editor session: one editing surface plus its media lifecycle state.
//!
//! The session owns the deletion guard, the insert-video dialog, and the
//! document sync for a single editor instance. On construction it loads
//! the initial content and registers the media toolbar actions against the
//! surface; hosts then route button presses to [`EditorSession::dispatch`].

mod actions;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::{DEFAULT_GATEWAY_TIMEOUT, EditorConfiguration, Settings};
use crate::dialog::{DialogController, DialogState};
use crate::error::EditorResult;
use crate::gateway::{
    AssetGateway, ContentId, HttpGateway, NoopGateway, StorageGateway, UploadedAsset,
};
use crate::guard::DeletionGuard;
use crate::policy::{IgnoreReason, ImageOriginPolicy, VideoIdPolicy};
use crate::storage::LocalAssetStore;
use crate::surface::{EditorSurface, MediaAction};
use crate::sync::{ContentSink, DocumentSync};

/// Result of a delete action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Backend confirmed the delete and the node was removed.
    Deleted { asset_id: String },
    /// Selection was not an eligible target; nothing happened.
    Ignored(IgnoreReason),
    /// Another delete is in flight; no gateway call was made.
    Busy,
}

/// Result of submitting the insert-video dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(UploadedAsset),
    /// Submitted with no file selected; the dialog closed.
    NoFileSelected,
    /// Gateway returned no assets; the dialog closed.
    NothingUploaded,
    /// The editor was disabled or deleting. Refused before upload the dialog
    /// stays open; refused after upload it closes without inserting.
    Unavailable,
}

/// Result of dispatching a toolbar action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    DialogOpened,
    Delete(DeleteOutcome),
    /// The editor is disabled by its host or busy deleting.
    Unavailable,
}

/// Caller-facing options for a session.
#[derive(Clone)]
pub struct EditorOptions {
    /// Initial document.
    pub content: Option<String>,
    /// Receives the serialized document after every change.
    pub set_content: Option<Arc<dyn ContentSink>>,
    /// Forces the surface read-only regardless of the guard.
    pub disabled: bool,
    pub gateway: Arc<dyn AssetGateway>,
    /// Substring an image source must contain to be deletable.
    pub storage: Option<String>,
    pub content_id: Option<ContentId>,
    pub configuration: EditorConfiguration,
    pub gateway_timeout: Duration,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            content: None,
            set_content: None,
            disabled: false,
            gateway: Arc::new(NoopGateway),
            storage: None,
            content_id: None,
            configuration: EditorConfiguration::default(),
            gateway_timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl EditorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from deployment settings.
    ///
    /// Uses the HTTP gateway when an asset API URL is configured, otherwise
    /// stores uploads on the local filesystem.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let gateway: Arc<dyn AssetGateway> = match &settings.asset_api_url {
            Some(url) => Arc::new(
                HttpGateway::with_timeout(url, settings.gateway_timeout)
                    .context("failed to create HTTP gateway")?,
            ),
            None => Arc::new(StorageGateway::new(Arc::new(LocalAssetStore::new(
                settings.uploads_dir.clone(),
                settings.files_url.clone(),
            )))),
        };

        Ok(Self {
            gateway,
            storage: settings.storage_origin.clone(),
            content_id: settings.content_id.clone().map(ContentId::from),
            configuration: settings.editor_configuration()?,
            gateway_timeout: settings.gateway_timeout,
            ..Self::default()
        })
    }

    pub fn content(mut self, html: impl Into<String>) -> Self {
        self.content = Some(html.into());
        self
    }

    pub fn on_change(mut self, sink: impl ContentSink + 'static) -> Self {
        self.set_content = Some(Arc::new(sink));
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn gateway(mut self, gateway: impl AssetGateway + 'static) -> Self {
        self.gateway = Arc::new(gateway);
        self
    }

    pub fn shared_gateway(mut self, gateway: Arc<dyn AssetGateway>) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn storage(mut self, origin: impl Into<String>) -> Self {
        self.storage = Some(origin.into());
        self
    }

    pub fn content_id(mut self, id: impl Into<ContentId>) -> Self {
        self.content_id = Some(id.into());
        self
    }

    pub fn configuration(mut self, configuration: EditorConfiguration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for EditorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorOptions")
            .field("has_content", &self.content.is_some())
            .field("has_sink", &self.set_content.is_some())
            .field("disabled", &self.disabled)
            .field("storage", &self.storage)
            .field("content_id", &self.content_id)
            .field("gateway_timeout", &self.gateway_timeout)
            .finish()
    }
}

/// Media lifecycle coordinator for one editor instance.
pub struct EditorSession<S: EditorSurface> {
    surface: Arc<Mutex<S>>,
    gateway: Arc<dyn AssetGateway>,
    guard: DeletionGuard,
    dialog: Mutex<DialogController>,
    sync: DocumentSync,
    image_policy: ImageOriginPolicy,
    video_policy: VideoIdPolicy,
    content_id: Option<ContentId>,
    disabled: AtomicBool,
    gateway_timeout: Duration,
    configuration: EditorConfiguration,
}

impl<S: EditorSurface> EditorSession<S> {
    /// Attach to a surface: load content, register actions, apply the
    /// disabled flag.
    pub fn new(mut surface: S, options: EditorOptions) -> Self {
        if let Some(content) = &options.content {
            surface.load(content);
        }
        for action in MediaAction::ALL {
            surface.register_action(action.button());
        }
        surface.set_read_only(options.disabled);

        info!(
            content_id = ?options.content_id,
            storage = ?options.storage,
            disabled = options.disabled,
            "editor session started"
        );

        Self {
            surface: Arc::new(Mutex::new(surface)),
            gateway: options.gateway,
            guard: DeletionGuard::new(),
            dialog: Mutex::new(DialogController::new()),
            sync: DocumentSync::new(options.set_content),
            image_policy: ImageOriginPolicy::new(options.storage),
            video_policy: VideoIdPolicy,
            content_id: options.content_id,
            disabled: AtomicBool::new(options.disabled),
            gateway_timeout: options.gateway_timeout,
            configuration: options.configuration,
        }
    }

    /// Shared handle to the surface.
    pub fn surface(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.surface)
    }

    /// Lock the surface. Do not hold the guard across an await.
    pub fn lock_surface(&self) -> MutexGuard<'_, S> {
        self.surface.lock()
    }

    pub fn guard(&self) -> &DeletionGuard {
        &self.guard
    }

    pub fn dialog_state(&self) -> DialogState {
        self.dialog.lock().state()
    }

    pub fn content_id(&self) -> Option<&ContentId> {
        self.content_id.as_ref()
    }

    pub fn configuration(&self) -> &EditorConfiguration {
        &self.configuration
    }

    /// Init options for the underlying engine.
    pub fn init_options(&self) -> Map<String, Value> {
        self.configuration.init_options()
    }

    /// Number of document pushes to the owner so far.
    pub fn sync_count(&self) -> u64 {
        self.sync.push_count()
    }

    /// Serialized document.
    pub fn document(&self) -> String {
        self.surface.lock().serialize()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Whether the surface currently accepts input.
    pub fn is_interactive(&self) -> bool {
        !self.is_disabled() && !self.guard.is_deleting()
    }

    /// Host-controlled disabled flag.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
        self.refresh_interactive();
    }

    fn refresh_interactive(&self) {
        let read_only = !self.is_interactive();
        self.surface.lock().set_read_only(read_only);
        debug!(read_only, "surface interactivity updated");
    }

    /// Content-changed notification from the surface (user edits).
    pub fn content_changed(&self) {
        let html = self.surface.lock().serialize();
        self.sync.push(html);
    }

    /// Route a toolbar action.
    pub async fn dispatch(&self, action: MediaAction) -> EditorResult<ActionOutcome> {
        if self.is_disabled() {
            debug!(action = %action, "action ignored, editor disabled");
            return Ok(ActionOutcome::Unavailable);
        }
        match action {
            MediaAction::InsertVideo => {
                if self.guard.is_deleting() {
                    return Ok(ActionOutcome::Unavailable);
                }
                self.open_video_dialog()?;
                Ok(ActionOutcome::DialogOpened)
            }
            MediaAction::DeleteImage => Ok(ActionOutcome::Delete(self.delete_image().await?)),
            MediaAction::DeleteVideo => Ok(ActionOutcome::Delete(self.delete_video().await?)),
        }
    }
}

impl<S: EditorSurface> std::fmt::Debug for EditorSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("content_id", &self.content_id)
            .field("guard", &self.guard.state())
            .field("disabled", &self.is_disabled())
            .field("sync", &self.sync)
            .finish()
    }
}

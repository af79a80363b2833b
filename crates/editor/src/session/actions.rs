//! Media action handlers: image upload hook, insert-video flow, deletes.

use std::future::Future;

use tracing::{debug, info, warn};

use super::{DeleteOutcome, EditorSession, InsertOutcome};
use crate::dialog::INSERT_VIDEO_DIALOG;
use crate::error::{EditorError, EditorResult};
use crate::gateway::{AssetKind, MediaFile};
use crate::guard::DeletePermit;
use crate::markup::{VIDEO_WRAPPER_CLASS, video_container};
use crate::policy::{DeletePolicy, IgnoreReason};
use crate::surface::{EditorSurface, NodeHandle, Notice};

pub(crate) const VIDEO_UPLOAD_FAILED: &str = "Video upload failed";
pub(crate) const DELETE_FAILED: &str = "Could not delete the selected media";

/// Delete in flight: holds the permit and keeps the surface read-only.
///
/// Dropping it clears the guard and restores interactivity, whichever way
/// the handler exits. The surface lock must not be held at drop.
struct InFlightDelete<'a, S: EditorSurface> {
    session: &'a EditorSession<S>,
    permit: Option<DeletePermit>,
}

impl<'a, S: EditorSurface> InFlightDelete<'a, S> {
    fn begin(session: &'a EditorSession<S>, permit: DeletePermit) -> Self {
        let in_flight = Self {
            session,
            permit: Some(permit),
        };
        session.refresh_interactive();
        in_flight
    }
}

impl<S: EditorSurface> Drop for InFlightDelete<'_, S> {
    fn drop(&mut self) {
        if let Some(permit) = self.permit.take() {
            permit.end_delete();
        }
        self.session.refresh_interactive();
    }
}

/// Video submission in flight. Dropping it closes the dialog.
struct InFlightSubmit<'a, S: EditorSurface> {
    session: &'a EditorSession<S>,
}

impl<S: EditorSurface> Drop for InFlightSubmit<'_, S> {
    fn drop(&mut self) {
        self.session.dialog.lock().finish_submit();
        let mut surface = self.session.surface.lock();
        surface.unblock_dialog();
        surface.close_dialog();
    }
}

impl<S: EditorSurface> EditorSession<S> {
    /// Run a gateway call under the session timeout.
    async fn bounded<T, F>(
        &self,
        operation: &'static str,
        call: F,
        rejected: impl FnOnce(anyhow::Error) -> EditorError,
    ) -> EditorResult<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.gateway_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(rejected(source)),
            Err(_) => Err(EditorError::Timeout {
                operation,
                after: self.gateway_timeout,
            }),
        }
    }

    /// Image upload hook used by the engine.
    ///
    /// Returns the URL of the first uploaded asset, or `None` when the
    /// gateway stored nothing. Errors go to the engine's failure path.
    pub async fn upload_image(&self, file: MediaFile) -> EditorResult<Option<String>> {
        debug!(file = %file.file_name, size = file.size(), "uploading image");
        let assets = self
            .bounded(
                "upload_image",
                self.gateway.upload_image(file, self.content_id.as_ref()),
                |source| EditorError::UploadFailed {
                    kind: AssetKind::Image,
                    source,
                },
            )
            .await
            .inspect_err(|e| warn!(error = %e, "image upload failed"))?;

        match assets.into_iter().next() {
            Some(asset) => {
                info!(asset_id = %asset.id, url = %asset.url, "image uploaded");
                Ok(Some(asset.url))
            }
            None => {
                debug!("image upload returned no assets");
                Ok(None)
            }
        }
    }

    /// Open the insert-video dialog.
    pub fn open_video_dialog(&self) -> EditorResult<()> {
        self.dialog.lock().open()?;
        self.surface.lock().open_dialog(&INSERT_VIDEO_DIALOG);
        Ok(())
    }

    /// File input change inside the open dialog.
    pub fn select_video_files(&self, files: Vec<MediaFile>) -> EditorResult<()> {
        self.dialog.lock().select_files(files)
    }

    /// Cancel the dialog. No gateway call, no document change.
    pub fn cancel_video_dialog(&self) -> EditorResult<()> {
        self.dialog.lock().cancel()?;
        self.surface.lock().close_dialog();
        Ok(())
    }

    /// Submit the dialog: upload the selected files and insert the first
    /// result as a video container in place of the selection.
    ///
    /// Refused while the editor is not interactive. A delete that starts
    /// during the upload finishes before the container is inserted.
    pub async fn submit_video_dialog(&self) -> EditorResult<InsertOutcome> {
        if !self.is_interactive() {
            debug!("video submit refused, editor not interactive");
            return Ok(InsertOutcome::Unavailable);
        }
        let files = self.dialog.lock().begin_submit()?;
        let Some(files) = files else {
            self.surface.lock().close_dialog();
            return Ok(InsertOutcome::NoFileSelected);
        };

        let in_flight = InFlightSubmit { session: self };
        self.surface
            .lock()
            .block_dialog(INSERT_VIDEO_DIALOG.uploading_message);
        debug!(count = files.len(), "uploading video");

        let result = self
            .bounded(
                "upload_video",
                self.gateway.upload_video(files, self.content_id.as_ref()),
                |source| EditorError::UploadFailed {
                    kind: AssetKind::Video,
                    source,
                },
            )
            .await;

        let assets = match result {
            Ok(assets) => assets,
            Err(e) => {
                drop(in_flight);
                warn!(error = %e, "video upload failed");
                self.surface.lock().notify(Notice::error(VIDEO_UPLOAD_FAILED));
                return Err(e);
            }
        };

        let Some(asset) = assets.into_iter().next() else {
            drop(in_flight);
            debug!("video upload returned no assets");
            return Ok(InsertOutcome::NothingUploaded);
        };

        self.guard.wait_idle().await;
        if self.is_disabled() {
            drop(in_flight);
            warn!(asset_id = %asset.id, "editor disabled during upload, video not inserted");
            return Ok(InsertOutcome::Unavailable);
        }

        let html = {
            let mut surface = self.surface.lock();
            surface.replace_selection(&video_container(&asset));
            surface.serialize()
        };
        drop(in_flight);
        self.sync.push(html);
        info!(asset_id = %asset.id, file = %asset.file_name, "video inserted");
        Ok(InsertOutcome::Inserted(asset))
    }

    /// Delete the selected image if it lives on the storage origin.
    pub async fn delete_image(&self) -> EditorResult<DeleteOutcome> {
        self.delete_selected(AssetKind::Image).await
    }

    /// Delete the selected video and its wrapper container.
    pub async fn delete_video(&self) -> EditorResult<DeleteOutcome> {
        self.delete_selected(AssetKind::Video).await
    }

    /// Resolve the selection to an asset id and the node to remove.
    fn delete_target(&self, kind: AssetKind) -> Result<(String, NodeHandle), IgnoreReason> {
        let surface = self.surface.lock();
        let node = surface
            .selected_node()
            .ok_or(IgnoreReason::NothingSelected)?;
        let policy: &dyn DeletePolicy = match kind {
            AssetKind::Image => &self.image_policy,
            AssetKind::Video => &self.video_policy,
        };
        let asset_id = policy.resolve(&node)?;
        let target = match kind {
            AssetKind::Image => node.handle,
            AssetKind::Video => surface
                .closest_with_class(node.handle, VIDEO_WRAPPER_CLASS)
                .ok_or(IgnoreReason::NoVideoWrapper)?,
        };
        Ok((asset_id, target))
    }

    async fn delete_selected(&self, kind: AssetKind) -> EditorResult<DeleteOutcome> {
        let (asset_id, target) = match self.delete_target(kind) {
            Ok(found) => found,
            Err(reason) => {
                debug!(kind = %kind, reason = %reason, "delete ignored");
                return Ok(DeleteOutcome::Ignored(reason));
            }
        };

        let Some(permit) = self.guard.try_begin_delete() else {
            debug!(kind = %kind, asset_id = %asset_id, "delete rejected, another is in flight");
            return Ok(DeleteOutcome::Busy);
        };
        let in_flight = InFlightDelete::begin(self, permit);
        debug!(kind = %kind, asset_id = %asset_id, "deleting asset");

        let content_id = self.content_id.as_ref();
        let call = match kind {
            AssetKind::Image => self.gateway.delete_image(&asset_id, content_id),
            AssetKind::Video => self.gateway.delete_video(&asset_id, content_id),
        };
        let operation = match kind {
            AssetKind::Image => "delete_image",
            AssetKind::Video => "delete_video",
        };
        let result = self
            .bounded(operation, call, |source| EditorError::DeleteFailed {
                kind,
                asset_id: asset_id.clone(),
                source,
            })
            .await;

        if let Err(e) = result {
            drop(in_flight);
            warn!(kind = %kind, asset_id = %asset_id, error = %e, "delete failed, node kept");
            self.surface.lock().notify(Notice::error(DELETE_FAILED));
            return Err(e);
        }

        let removed = {
            let mut surface = self.surface.lock();
            surface.remove_node(target).then(|| surface.serialize())
        };
        drop(in_flight);

        match removed {
            Some(html) => self.sync.push(html),
            None => debug!(asset_id = %asset_id, "deleted node was already gone"),
        }
        info!(kind = %kind, asset_id = %asset_id, "asset deleted");
        Ok(DeleteOutcome::Deleted { asset_id })
    }
}

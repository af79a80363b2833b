//! Trovato media editor.
//!
//! Coordinates a rich-text editing surface with an external asset store:
//! uploads images and videos through an [`AssetGateway`], inserts video
//! markup, deletes media on request, and keeps the owner's copy of the
//! document in sync.

pub mod config;
pub mod dialog;
pub mod dom;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod logging;
pub mod markup;
pub mod policy;
pub mod session;
pub mod storage;
pub mod surface;
pub mod sync;

pub use config::{EditorConfiguration, Settings};
pub use error::{EditorError, EditorResult};
pub use gateway::{
    AssetGateway, AssetKind, CallbackGateway, ContentId, HttpGateway, MediaFile, NoopGateway,
    StorageGateway, UploadResult, UploadedAsset,
};
pub use guard::{DeletePermit, DeletionGuard, GuardState};
pub use policy::IgnoreReason;
pub use session::{ActionOutcome, DeleteOutcome, EditorOptions, EditorSession, InsertOutcome};
pub use surface::{EditorSurface, MediaAction, MemoryEditor};
pub use sync::ContentSink;

//! Document sync: pushes the serialized document to its owner.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

/// Receiver of the serialized document after every change.
pub trait ContentSink: Send + Sync {
    fn set_content(&self, html: String);
}

impl<F> ContentSink for F
where
    F: Fn(String) + Send + Sync,
{
    fn set_content(&self, html: String) {
        self(html);
    }
}

/// Fire-and-forget channel from the editor to the owning form state.
#[derive(Clone, Default)]
pub struct DocumentSync {
    sink: Option<Arc<dyn ContentSink>>,
    pushes: Arc<AtomicU64>,
}

impl DocumentSync {
    pub fn new(sink: Option<Arc<dyn ContentSink>>) -> Self {
        Self {
            sink,
            pushes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Hand the current document to the owner.
    pub fn push(&self, html: String) {
        let count = self.pushes.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(push = count, len = html.len(), "document synced");
        if let Some(sink) = &self.sink {
            sink.set_content(html);
        }
    }

    /// Number of pushes so far, including those without a sink.
    pub fn push_count(&self) -> u64 {
        self.pushes.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for DocumentSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentSync")
            .field("has_sink", &self.sink.is_some())
            .field("pushes", &self.push_count())
            .finish()
    }
}

//! Deletion guard.
//!
//! A two-state latch (`Idle -> Deleting -> Idle`) owned by one editor
//! session. [`DeletionGuard::try_begin_delete`] hands out at most one
//! [`DeletePermit`] at a time; dropping the permit returns the guard to
//! idle, so every exit path of a delete handler (success, failure,
//! timeout, or the handler future being dropped) re-enables the editor.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Guard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Deleting,
}

/// Shared handle to a session's deletion latch.
#[derive(Debug, Clone)]
pub struct DeletionGuard {
    state: Arc<watch::Sender<GuardState>>,
}

impl Default for DeletionGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl DeletionGuard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GuardState::Idle);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Start a delete if none is in flight.
    ///
    /// Returns `None` when another delete already holds the guard.
    pub fn try_begin_delete(&self) -> Option<DeletePermit> {
        let began = self.state.send_if_modified(|state| match *state {
            GuardState::Idle => {
                *state = GuardState::Deleting;
                true
            }
            GuardState::Deleting => false,
        });
        if began {
            debug!("deletion guard set");
            Some(DeletePermit {
                guard: self.clone(),
            })
        } else {
            debug!("deletion guard busy");
            None
        }
    }

    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    pub fn is_deleting(&self) -> bool {
        self.state() == GuardState::Deleting
    }

    /// Wait until no delete is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| *state == GuardState::Idle).await;
    }

    /// Observe guard transitions.
    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    fn end_delete(&self) {
        self.state.send_replace(GuardState::Idle);
        debug!("deletion guard cleared");
    }
}

/// Proof that the holder owns the in-flight delete slot.
#[derive(Debug)]
#[must_use = "dropping the permit immediately clears the deletion guard"]
pub struct DeletePermit {
    guard: DeletionGuard,
}

impl DeletePermit {
    /// Clear the guard now.
    pub fn end_delete(self) {
        drop(self);
    }
}

impl Drop for DeletePermit {
    fn drop(&mut self) {
        self.guard.end_delete();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_rejected_until_permit_dropped() {
        let guard = DeletionGuard::new();
        assert_eq!(guard.state(), GuardState::Idle);

        let permit = guard.try_begin_delete().unwrap();
        assert!(guard.is_deleting());
        assert!(guard.try_begin_delete().is_none());

        permit.end_delete();
        assert!(!guard.is_deleting());
        assert!(guard.try_begin_delete().is_some());
    }

    #[test]
    fn clones_share_state() {
        let guard = DeletionGuard::new();
        let other = guard.clone();
        let _permit = guard.try_begin_delete().unwrap();
        assert!(other.is_deleting());
        assert!(other.try_begin_delete().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let guard = DeletionGuard::new();
        let mut rx = guard.subscribe();

        let permit = guard.try_begin_delete().unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), GuardState::Deleting);

        drop(permit);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), GuardState::Idle);
    }

    #[tokio::test]
    async fn wait_idle_returns_after_permit_dropped() {
        let guard = DeletionGuard::new();
        guard.wait_idle().await;

        let permit = guard.try_begin_delete().unwrap();
        let waiter = guard.clone();
        let handle = tokio::spawn(async move { waiter.wait_idle().await });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        drop(permit);
        handle.await.unwrap();
        assert_eq!(guard.state(), GuardState::Idle);
    }

    #[tokio::test]
    async fn permit_dropped_with_cancelled_future_clears_guard() {
        let guard = DeletionGuard::new();
        let task_guard = guard.clone();
        let handle = tokio::spawn(async move {
            let _permit = task_guard.try_begin_delete().unwrap();
            std::future::pending::<()>().await;
        });
        while !guard.is_deleting() {
            tokio::task::yield_now().await;
        }
        handle.abort();
        let _ = handle.await;
        assert!(!guard.is_deleting());
    }
}

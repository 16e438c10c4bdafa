//! After-commit callback queue.
//!
//! Services push reconciliation callbacks onto the queue while the local
//! transaction is open and flush it only after `commit()` has returned, so
//! a remote call never observes (and can never roll back) uncommitted local
//! state. Dropping an unflushed queue discards its callbacks, which is
//! exactly what a rolled-back transaction needs.

use futures::future::BoxFuture;
use tracing::warn;

/// Callbacks to run once the surrounding transaction is known committed.
#[derive(Default)]
pub struct PostCommitQueue {
    callbacks: Vec<(&'static str, BoxFuture<'static, Result<(), anyhow::Error>>)>,
}

impl PostCommitQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a callback. `label` names the action in degradation warnings.
    pub fn push(&mut self, label: &'static str, fut: BoxFuture<'static, Result<(), anyhow::Error>>) {
        self.callbacks.push((label, fut));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Run all queued callbacks in order. A failing callback is logged and
    /// dropped; flush itself never fails the operation.
    pub async fn flush(self) {
        for (label, fut) in self.callbacks {
            if let Err(e) = fut.await {
                warn!(action = label, error = %e, "post-commit action failed; local state is authoritative");
            }
        }
    }
}

impl std::fmt::Debug for PostCommitQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostCommitQueue")
            .field("pending", &self.callbacks.len())
            .finish()
    }
}

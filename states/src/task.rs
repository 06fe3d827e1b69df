//! Identity and cancellation for the controller's background work.
//!
//! Debounce timers and page fetches both run as spawned tokio tasks that
//! report back over the registry's event channel. Each one is tagged with a
//! `TaskId`, the view it belongs to plus a per-view generation, so the
//! registry can tell whether an arriving event is still the latest one.
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use tourdesk_states::{TaskHandle, TaskId, ViewKey};
//!
//! let handle = TaskHandle::new(TaskId::new(ViewKey::new("tours"), 1), CancellationToken::new());
//!
//! // A newer input for "tours" arrived.
//! handle.cancel();
//! ```

use tokio_util::sync::CancellationToken;

use crate::ViewKey;

/// Identifier of one spawned timer or fetch.
///
/// Generations increase monotonically per view, so for two ids with the same
/// key the larger generation was issued later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    key: ViewKey,
    generation: u64,
}

impl TaskId {
    pub fn new(key: ViewKey, generation: u64) -> Self {
        Self { key, generation }
    }

    /// The view this task belongs to.
    pub fn key(&self) -> ViewKey {
        self.key
    }

    /// Per-view counter; higher means more recently issued.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A pending task together with the token that stops it.
///
/// Cancellation is cooperative: the task races its work against
/// `token.cancelled()` in a `tokio::select!`, and stops without reporting
/// once the token fires.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

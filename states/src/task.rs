//! Generation-tagged tasks with cooperative cancellation.
//!
//! - `TaskId`: names a unit of background work by kind and generation
//! - `TaskHandle`: a `TaskId` plus the `CancellationToken` the task watches
//! - `TaskSlot`: at most one live task per slot; starting a new one supersedes the old
//!
//! A slot is how single-flight is expressed: callers ask `is_busy()` (or use
//! `try_begin()`) before starting work, and results are only accepted through
//! `finish(id)`, which rejects any id that is no longer current.
//!
//! ```ignore
//! let mut slot = TaskSlot::new("users_page");
//! let handle = slot.begin();
//! // spawn work with handle.cancellation_token() ...
//! assert!(slot.finish(handle.id()));
//! ```

use tokio_util::sync::CancellationToken;

/// Unique identifier for a spawned task.
///
/// Two ids from the same slot share `kind`; the later one has the higher `generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId {
    kind: &'static str,
    generation: u64,
}

impl TaskId {
    pub fn new(kind: &'static str, generation: u64) -> Self {
        Self { kind, generation }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.generation)
    }
}

/// Handle to a spawned task with cooperative cancellation support.
///
/// Cancellation does not abort anything by itself. The task must race its work against
/// `cancellation_token().cancelled()` (usually inside `tokio::select!`).
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    cancel_token: CancellationToken,
}

impl TaskHandle {
    pub fn new(id: TaskId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    /// The id this handle was issued under.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// A clone of the token the task should watch.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Request cancellation. The task observes it at its next `select!` point.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Holds the single live task of one kind.
#[derive(Debug)]
pub struct TaskSlot {
    kind: &'static str,
    generation: u64,
    current: Option<TaskHandle>,
}

impl TaskSlot {
    /// An idle slot. `kind` labels every id it hands out (`"users_page#3"`).
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mut slot = TaskSlot::new("positions");
    /// let first = slot.try_begin().expect("slot is idle");
    /// assert!(slot.try_begin().is_none());
    ///
    /// let second = slot.begin();
    /// assert!(first.is_cancelled());
    /// assert!(!slot.finish(first.id()));
    /// assert!(slot.finish(second.id()));
    /// ```
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            generation: 0,
            current: None,
        }
    }

    /// Start a new generation, cancelling whatever task is still live.
    pub fn begin(&mut self) -> TaskHandle {
        if let Some(previous) = self.current.take() {
            log::debug!("TaskSlot: {} superseded", previous.id());
            previous.cancel();
        }
        self.generation += 1;
        let handle = TaskHandle::new(
            TaskId::new(self.kind, self.generation),
            CancellationToken::new(),
        );
        self.current = Some(handle.clone());
        handle
    }

    /// Start a new generation only if nothing is live.
    pub fn try_begin(&mut self) -> Option<TaskHandle> {
        if self.is_busy() {
            None
        } else {
            Some(self.begin())
        }
    }

    /// True while a task has begun and not finished or been cancelled.
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Whether `id` belongs to the live task.
    pub fn is_current(&self, id: TaskId) -> bool {
        self.current.as_ref().is_some_and(|handle| handle.id() == id)
    }

    /// Mark `id` as completed. Returns false (and changes nothing) if `id` is stale.
    pub fn finish(&mut self, id: TaskId) -> bool {
        if self.is_current(id) {
            self.current = None;
            true
        } else {
            false
        }
    }

    /// Cancel the live task, if any, leaving the slot idle.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_equality() {
        let id1 = TaskId::new("users_page", 1);
        let id2 = TaskId::new("users_page", 1);
        let id3 = TaskId::new("users_page", 2);
        let id4 = TaskId::new("positions", 1);

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_ne!(id1, id4);
        assert_eq!(id3.to_string(), "users_page#2");
    }

    #[test]
    fn task_handle_clone_shares_token() {
        let handle1 = TaskHandle::new(TaskId::new("t", 1), CancellationToken::new());
        let handle2 = handle1.clone();
        let token = handle1.cancellation_token();

        handle1.cancel();

        assert!(handle2.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[test]
    fn slot_begin_increments_generation() {
        let mut slot = TaskSlot::new("users_page");
        let first = slot.begin();
        assert_eq!(first.id().generation(), 1);
        assert!(slot.finish(first.id()));

        let second = slot.begin();
        assert_eq!(second.id().generation(), 2);
        assert_eq!(second.id().kind(), "users_page");
    }

    #[test]
    fn try_begin_refuses_while_busy() {
        let mut slot = TaskSlot::new("users_page");
        let first = slot.try_begin().expect("idle slot starts a task");

        assert!(slot.is_busy());
        assert!(slot.try_begin().is_none());
        assert!(slot.try_begin().is_none());

        assert!(slot.finish(first.id()));
        assert!(!slot.is_busy());
        assert!(slot.try_begin().is_some());
    }

    #[test]
    fn begin_supersedes_and_cancels_previous() {
        let mut slot = TaskSlot::new("users_page");
        let old = slot.begin();
        let new = slot.begin();

        assert!(old.is_cancelled());
        assert!(!new.is_cancelled());
        assert!(!slot.finish(old.id()), "stale id must be rejected");
        assert!(slot.is_busy());
        assert!(slot.finish(new.id()));
    }

    #[test]
    fn cancel_leaves_slot_idle() {
        let mut slot = TaskSlot::new("positions");
        let handle = slot.begin();
        slot.cancel();

        assert!(handle.is_cancelled());
        assert!(!slot.is_busy());
        assert!(!slot.finish(handle.id()));
    }
}

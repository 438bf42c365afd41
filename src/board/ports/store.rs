//! Unit-of-work port for tasks, board placements and the status log.

use crate::board::domain::{
    BoardEntry, StatusLogEntry, SubtaskId, Task, TaskId, UserBoard, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for board store operations.
pub type BoardStoreResult<T> = Result<T, BoardStoreError>;

/// Persistence contract for the task registry, the position ledger and the
/// status audit log.
///
/// Every multi-step mutation runs through [`BoardStore::transact`]; the read
/// methods observe committed state only.
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Runs `work` as one atomic unit.
    ///
    /// All writes made through the transaction are published together when
    /// `work` returns `Ok`, and discarded when it returns `Err`.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`BoardStoreError`]
    /// converted into `E` when the unit cannot be started or committed.
    async fn transact<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BoardTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<BoardStoreError> + Send + 'static;

    /// Finds a task by identifier.
    async fn find_task(&self, task_id: TaskId) -> BoardStoreResult<Option<Task>>;

    /// Loads every placement of `user_id` without locking.
    async fn load_board(&self, user_id: UserId) -> BoardStoreResult<UserBoard>;

    /// Returns the placements of `user_id` joined with their tasks.
    async fn board_entries(&self, user_id: UserId) -> BoardStoreResult<Vec<BoardEntry>>;

    /// Returns the status log of a task in insertion order.
    async fn status_log(&self, task_id: TaskId) -> BoardStoreResult<Vec<StatusLogEntry>>;

    /// Flags every in-flight task whose deadline passed before `now`.
    ///
    /// Returns the number of tasks flagged by this call. Placements are
    /// never touched.
    async fn mark_missed_deadlines(&self, now: DateTime<Utc>) -> BoardStoreResult<u64>;
}

/// Operations available inside one atomic unit.
///
/// Methods are synchronous: the unit runs on a thread that owns the
/// underlying connection or state lock for its whole duration.
pub trait BoardTransaction {
    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::Persistence`] on storage failure.
    fn find_task(&mut self, task_id: TaskId) -> BoardStoreResult<Option<Task>>;

    /// Finds a task and holds its row lock until the unit ends.
    ///
    /// A unit that reads a task in order to rewrite it must use this rather
    /// than [`Self::find_task`], so that concurrent writers of the same task
    /// queue behind it and it sees their committed state.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::ConcurrencyConflict`] when the row lock
    /// cannot be taken.
    fn lock_task(&mut self, task_id: TaskId) -> BoardStoreResult<Option<Task>>;

    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::DuplicateTask`] when the identifier exists.
    fn insert_task(&mut self, task: &Task) -> BoardStoreResult<()>;

    /// Persists changes to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::TaskNotFound`] when the task does not
    /// exist.
    fn update_task(&mut self, task: &Task) -> BoardStoreResult<()>;

    /// Counts the tasks of `assignee` starting on `day` (UTC) that still
    /// count toward the daily limit.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::Persistence`] on storage failure.
    fn count_open_tasks_on(&mut self, assignee: UserId, day: NaiveDate) -> BoardStoreResult<u32>;

    /// Locks the board of `user_id` until the unit ends and loads it.
    ///
    /// Callers locking several boards take them in ascending user order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::ConcurrencyConflict`] when the lock cannot
    /// be taken.
    fn lock_board(&mut self, user_id: UserId) -> BoardStoreResult<UserBoard>;

    /// Returns the owners of every board holding `task_id`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::Persistence`] on storage failure.
    fn placement_holders(&mut self, task_id: TaskId) -> BoardStoreResult<Vec<UserId>>;

    /// Writes the placements of `board` that changed since it was loaded.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::Persistence`] on storage failure.
    fn save_board(&mut self, board: &UserBoard) -> BoardStoreResult<()>;

    /// Appends a status log entry.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::Persistence`] on storage failure.
    fn append_status_log(&mut self, entry: &StatusLogEntry) -> BoardStoreResult<()>;
}

/// Errors returned by board store implementations.
#[derive(Debug, Clone, Error)]
pub enum BoardStoreError {
    /// The task was not found.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The subtask was not found.
    #[error("subtask not found: {0}")]
    SubtaskNotFound(SubtaskId),

    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// A subtask with the same identifier already exists.
    #[error("duplicate subtask identifier: {0}")]
    DuplicateSubtask(SubtaskId),

    /// A concurrent unit touched the same rows; the caller may retry.
    #[error("concurrent update conflict, retry the operation")]
    ConcurrencyConflict,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl BoardStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` when retrying the unit may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }
}

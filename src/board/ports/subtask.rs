//! Repository port for subtask persistence.

use super::BoardStoreResult;
use crate::board::domain::{Subtask, SubtaskId, TaskId};
use async_trait::async_trait;

/// Subtask persistence contract.
#[async_trait]
pub trait SubtaskRepository: Send + Sync {
    /// Stores a new subtask.
    ///
    /// # Errors
    ///
    /// Returns [`super::BoardStoreError::DuplicateSubtask`] when the
    /// identifier already exists.
    async fn store(&self, subtask: &Subtask) -> BoardStoreResult<()>;

    /// Persists changes to an existing subtask.
    ///
    /// # Errors
    ///
    /// Returns [`super::BoardStoreError::SubtaskNotFound`] when the subtask
    /// does not exist.
    async fn update(&self, subtask: &Subtask) -> BoardStoreResult<()>;

    /// Finds a subtask by identifier.
    async fn find_by_id(&self, id: SubtaskId) -> BoardStoreResult<Option<Subtask>>;

    /// Returns the subtasks of a task, oldest first.
    async fn find_by_task(&self, task_id: TaskId) -> BoardStoreResult<Vec<Subtask>>;
}

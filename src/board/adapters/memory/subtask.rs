//! In-memory subtask repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::{Subtask, SubtaskId, TaskId},
    ports::{BoardStoreError, BoardStoreResult, SubtaskRepository},
};

/// Thread-safe in-memory subtask repository.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubtaskRepository {
    subtasks: Arc<RwLock<HashMap<SubtaskId, Subtask>>>,
}

impl InMemorySubtaskRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> BoardStoreError {
    BoardStoreError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl SubtaskRepository for InMemorySubtaskRepository {
    async fn store(&self, subtask: &Subtask) -> BoardStoreResult<()> {
        let mut subtasks = self.subtasks.write().map_err(lock_error)?;
        if subtasks.contains_key(&subtask.id()) {
            return Err(BoardStoreError::DuplicateSubtask(subtask.id()));
        }
        subtasks.insert(subtask.id(), subtask.clone());
        Ok(())
    }

    async fn update(&self, subtask: &Subtask) -> BoardStoreResult<()> {
        let mut subtasks = self.subtasks.write().map_err(lock_error)?;
        let stored = subtasks
            .get_mut(&subtask.id())
            .ok_or(BoardStoreError::SubtaskNotFound(subtask.id()))?;
        *stored = subtask.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: SubtaskId) -> BoardStoreResult<Option<Subtask>> {
        let subtasks = self.subtasks.read().map_err(lock_error)?;
        Ok(subtasks.get(&id).cloned())
    }

    async fn find_by_task(&self, task_id: TaskId) -> BoardStoreResult<Vec<Subtask>> {
        let subtasks = self.subtasks.read().map_err(lock_error)?;
        let mut found: Vec<Subtask> = subtasks
            .values()
            .filter(|subtask| subtask.task_id() == task_id)
            .cloned()
            .collect();
        found.sort_by_key(|subtask| (subtask.created_at(), subtask.id()));
        Ok(found)
    }
}

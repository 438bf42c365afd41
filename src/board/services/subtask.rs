//! Subtask lifecycle under an existing task.
//!
//! Subtasks never appear on a board and carry no position; their status is
//! set directly without the transition guard.

use super::{CreateSubtaskRequest, TaskBoardError, TaskBoardResult};
use crate::board::{
    domain::{Subtask, SubtaskEdit, SubtaskId, TaskId, TaskStatus},
    ports::{BoardStore, SubtaskRepository},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info};

/// Subtask orchestration service.
pub struct SubtaskService<S, R, C>
where
    S: BoardStore,
    R: SubtaskRepository,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<S, R, C> Clone for SubtaskService<S, R, C>
where
    S: BoardStore,
    R: SubtaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S, R, C> SubtaskService<S, R, C>
where
    S: BoardStore,
    R: SubtaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new subtask service.
    #[must_use]
    pub const fn new(store: Arc<S>, repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            store,
            repository,
            clock,
        }
    }

    /// Creates a subtask under an existing task. The subtask inherits the
    /// parent's project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::TaskNotFound`] when the parent task does not
    /// exist and [`TaskBoardError::Domain`] for invalid input.
    #[tracing::instrument(skip(self, request))]
    pub async fn create_subtask(&self, request: CreateSubtaskRequest) -> TaskBoardResult<Subtask> {
        let draft = request.into_draft()?;
        let parent = self
            .store
            .find_task(draft.task_id)
            .await?
            .ok_or(TaskBoardError::TaskNotFound(draft.task_id))?;
        let subtask = Subtask::new(draft, parent.project_id(), &*self.clock);
        self.repository.store(&subtask).await?;
        info!(subtask_id = %subtask.id(), task_id = %parent.id(), "subtask created");
        Ok(subtask)
    }

    /// Edits a subtask's fields other than status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::SubtaskNotFound`] when the subtask does not
    /// exist.
    #[tracing::instrument(skip(self, edit))]
    pub async fn edit_subtask(
        &self,
        subtask_id: SubtaskId,
        edit: SubtaskEdit,
    ) -> TaskBoardResult<Subtask> {
        let mut subtask = self.get_subtask(subtask_id).await?;
        subtask.apply_edit(edit, &*self.clock);
        self.repository.update(&subtask).await?;
        debug!("subtask edited");
        Ok(subtask)
    }

    /// Sets a subtask's status from a column literal.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::InvalidColumn`] for an unknown literal and
    /// [`TaskBoardError::SubtaskNotFound`] when the subtask does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_subtask_status(
        &self,
        subtask_id: SubtaskId,
        status: &str,
    ) -> TaskBoardResult<Subtask> {
        let target = TaskStatus::try_from(status)?;
        let mut subtask = self.get_subtask(subtask_id).await?;
        subtask.set_status(target, &*self.clock);
        self.repository.update(&subtask).await?;
        info!(status = %target, "subtask status updated");
        Ok(subtask)
    }

    /// Returns a subtask.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::SubtaskNotFound`] when it does not exist.
    pub async fn get_subtask(&self, subtask_id: SubtaskId) -> TaskBoardResult<Subtask> {
        self.repository
            .find_by_id(subtask_id)
            .await?
            .ok_or(TaskBoardError::SubtaskNotFound(subtask_id))
    }

    /// Lists the subtasks of a task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBoardError::TaskNotFound`] when the task does not exist.
    pub async fn list_subtasks(&self, task_id: TaskId) -> TaskBoardResult<Vec<Subtask>> {
        if self.store.find_task(task_id).await?.is_none() {
            return Err(TaskBoardError::TaskNotFound(task_id));
        }
        Ok(self.repository.find_by_task(task_id).await?)
    }
}

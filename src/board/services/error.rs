//! Service-level error taxonomy.

use crate::board::{
    domain::{ParseTaskStatusError, SubtaskId, TaskDomainError, TaskId, UserId},
    ports::{BoardStoreError, DirectoryError},
};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by the board services.
///
/// Every failure rolls back the whole unit of work it happened in.
#[derive(Debug, Clone, Error)]
pub enum TaskBoardError {
    /// Domain validation failed or the transition guard rejected a move.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The requested column literal is not a known column.
    #[error(transparent)]
    InvalidColumn(#[from] ParseTaskStatusError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The subtask does not exist.
    #[error("subtask not found: {0}")]
    SubtaskNotFound(SubtaskId),

    /// The user is unknown to the directory.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The assignee already holds the maximum number of open tasks starting
    /// on that day.
    #[error("user {user_id} already has {limit} open tasks starting on {day}")]
    LimitExceeded {
        /// Assignee whose limit was reached.
        user_id: UserId,
        /// UTC day the rejected task starts on.
        day: NaiveDate,
        /// Limit in force for the assignee.
        limit: u32,
    },

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] BoardStoreError),

    /// User directory failure.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl TaskBoardError {
    /// Returns `true` when retrying the operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Returns `true` when the error reports a missing task, subtask, user
    /// or placement.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_)
                | Self::SubtaskNotFound(_)
                | Self::UserNotFound(_)
                | Self::Domain(TaskDomainError::PlacementNotFound { .. })
                | Self::Store(BoardStoreError::TaskNotFound(_) | BoardStoreError::SubtaskNotFound(_))
        )
    }
}

/// Result type for board service operations.
pub type TaskBoardResult<T> = Result<T, TaskBoardError>;

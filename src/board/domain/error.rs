//! Error types for task board domain validation and parsing.

use super::{TaskId, TaskStatus, UserId};
use thiserror::Error;

/// Errors returned while constructing or mutating domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The requested status change violates the transition guard.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Task whose move was rejected.
        task_id: TaskId,
        /// Current status of the task.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// Board positions are one-based.
    #[error("invalid board position {0}, expected a positive integer")]
    InvalidPosition(u64),

    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// The deadline precedes the start timestamp.
    #[error("task deadline must not precede its start")]
    DeadlineBeforeStart,

    /// The user's board has no placement for the task.
    #[error("user {user_id} has no board placement for task {task_id}")]
    PlacementNotFound {
        /// Board owner.
        user_id: UserId,
        /// Task that was looked up.
        task_id: TaskId,
    },

    /// The user's board already holds a placement for the task.
    #[error("user {user_id} already has a board placement for task {task_id}")]
    DuplicatePlacement {
        /// Board owner.
        user_id: UserId,
        /// Task that was placed twice.
        task_id: TaskId,
    },
}

/// Error returned for an unknown status or column literal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task column: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned for an unknown priority or priority flag literal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned for an unknown user role literal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown user role: {0}")]
pub struct ParseUserRoleError(pub String);

//! Request payloads accepted by the board services.

use crate::board::domain::{
    Priority, PriorityFlag, ProjectId, Schedule, SubtaskDraft, TaskDomainError, TaskDraft, TaskId,
    TaskName, UserId,
};
use chrono::{DateTime, Utc};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    project_id: ProjectId,
    assignee_id: UserId,
    name: String,
    description: Option<String>,
    starts_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    priority: Priority,
    priority_flag: PriorityFlag,
}

impl CreateTaskRequest {
    /// Creates a request with the required task fields.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        assignee_id: UserId,
        name: impl Into<String>,
        starts_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id,
            assignee_id,
            name: name.into(),
            description: None,
            starts_at,
            deadline,
            priority: Priority::default(),
            priority_flag: PriorityFlag::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the pinning flag.
    #[must_use]
    pub const fn with_priority_flag(mut self, priority_flag: PriorityFlag) -> Self {
        self.priority_flag = priority_flag;
        self
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assignee_id(&self) -> UserId {
        self.assignee_id
    }

    pub(super) fn into_draft(self) -> Result<TaskDraft, TaskDomainError> {
        Ok(TaskDraft {
            project_id: self.project_id,
            assignee_id: self.assignee_id,
            name: TaskName::new(self.name)?,
            description: self.description,
            schedule: Schedule::new(self.starts_at, self.deadline)?,
            priority: self.priority,
            priority_flag: self.priority_flag,
        })
    }
}

/// Request payload for moving a task card.
///
/// The column arrives as a literal and the position as a raw integer; both
/// are validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTaskRequest {
    /// Task to move.
    pub task_id: TaskId,
    /// User whose board the card is dragged on.
    pub acting_user: UserId,
    /// Target column literal, e.g. `"InProgress"` or `"in_progress"`.
    pub column: String,
    /// One-based target position.
    pub position: u64,
}

impl MoveTaskRequest {
    /// Creates a move request.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        acting_user: UserId,
        column: impl Into<String>,
        position: u64,
    ) -> Self {
        Self {
            task_id,
            acting_user,
            column: column.into(),
            position,
        }
    }
}

/// Request payload for duplicating a task onto a new assignee and schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateTaskRequest {
    /// Task to copy.
    pub source_task_id: TaskId,
    /// Assignee of the copy.
    pub assignee_id: UserId,
    /// Start of the copy.
    pub starts_at: DateTime<Utc>,
    /// Deadline of the copy.
    pub deadline: DateTime<Utc>,
}

/// Request payload for creating a subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubtaskRequest {
    task_id: TaskId,
    assignee_id: UserId,
    name: String,
    description: Option<String>,
    starts_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    priority: Priority,
    priority_flag: PriorityFlag,
}

impl CreateSubtaskRequest {
    /// Creates a request with the required subtask fields.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        assignee_id: UserId,
        name: impl Into<String>,
        starts_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            assignee_id,
            name: name.into(),
            description: None,
            starts_at,
            deadline,
            priority: Priority::default(),
            priority_flag: PriorityFlag::default(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the pinning flag.
    #[must_use]
    pub const fn with_priority_flag(mut self, priority_flag: PriorityFlag) -> Self {
        self.priority_flag = priority_flag;
        self
    }

    pub(super) fn into_draft(self) -> Result<SubtaskDraft, TaskDomainError> {
        Ok(SubtaskDraft {
            task_id: self.task_id,
            assignee_id: self.assignee_id,
            name: TaskName::new(self.name)?,
            description: self.description,
            schedule: Schedule::new(self.starts_at, self.deadline)?,
            priority: self.priority,
            priority_flag: self.priority_flag,
        })
    }
}

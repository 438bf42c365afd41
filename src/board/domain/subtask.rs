//! Subtask records owned by a parent task.

use super::{
    Priority, PriorityFlag, ProjectId, Schedule, SubtaskId, TaskId, TaskName, TaskStatus, UserId,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Validated input for a new subtask.
///
/// The project reference is not part of the draft: it is copied from the
/// parent task when the subtask is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskDraft {
    /// Parent task.
    pub task_id: TaskId,
    /// User the subtask is assigned to.
    pub assignee_id: UserId,
    /// Subtask name.
    pub name: TaskName,
    /// Optional description.
    pub description: Option<String>,
    /// Start and deadline.
    pub schedule: Schedule,
    /// Priority.
    pub priority: Priority,
    /// Pinning flag.
    pub priority_flag: PriorityFlag,
}

/// Optional field changes applied by a subtask edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtaskEdit {
    /// New name.
    pub name: Option<TaskName>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// New schedule.
    pub schedule: Option<Schedule>,
    /// New assignee.
    pub assignee_id: Option<UserId>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New pinning flag.
    pub priority_flag: Option<PriorityFlag>,
    /// New on-hold flag.
    pub on_hold: Option<bool>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Subtask record.
///
/// Subtasks have no board placements, so their status is edited directly and
/// is independent of the parent task's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    id: SubtaskId,
    task_id: TaskId,
    project_id: ProjectId,
    assignee_id: UserId,
    name: TaskName,
    description: Option<String>,
    schedule: Schedule,
    status: TaskStatus,
    priority: Priority,
    priority_flag: PriorityFlag,
    missed_deadline: bool,
    is_active: bool,
    on_hold: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSubtaskData {
    /// Persisted identifier.
    pub id: SubtaskId,
    /// Persisted parent task.
    pub task_id: TaskId,
    /// Persisted project reference.
    pub project_id: ProjectId,
    /// Persisted assignee.
    pub assignee_id: UserId,
    /// Persisted name.
    pub name: TaskName,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted schedule.
    pub schedule: Schedule,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted pinning flag.
    pub priority_flag: PriorityFlag,
    /// Persisted missed-deadline flag.
    pub missed_deadline: bool,
    /// Persisted active flag.
    pub is_active: bool,
    /// Persisted on-hold flag.
    pub on_hold: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Subtask {
    /// Creates a subtask in [`TaskStatus::Todo`] under a parent task of
    /// `project_id`.
    #[must_use]
    pub fn new(draft: SubtaskDraft, project_id: ProjectId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: SubtaskId::new(),
            task_id: draft.task_id,
            project_id,
            assignee_id: draft.assignee_id,
            name: draft.name,
            description: draft.description,
            schedule: draft.schedule,
            status: TaskStatus::Todo,
            priority: draft.priority,
            priority_flag: draft.priority_flag,
            missed_deadline: false,
            is_active: true,
            on_hold: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a subtask from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSubtaskData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            project_id: data.project_id,
            assignee_id: data.assignee_id,
            name: data.name,
            description: data.description,
            schedule: data.schedule,
            status: data.status,
            priority: data.priority,
            priority_flag: data.priority_flag,
            missed_deadline: data.missed_deadline,
            is_active: data.is_active,
            on_hold: data.on_hold,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the subtask identifier.
    #[must_use]
    pub const fn id(&self) -> SubtaskId {
        self.id
    }

    /// Returns the parent task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assignee_id(&self) -> UserId {
        self.assignee_id
    }

    /// Returns the name.
    #[must_use]
    pub const fn name(&self) -> &TaskName {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the schedule.
    #[must_use]
    pub const fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the pinning flag.
    #[must_use]
    pub const fn priority_flag(&self) -> PriorityFlag {
        self.priority_flag
    }

    /// Returns the missed-deadline flag.
    #[must_use]
    pub const fn missed_deadline(&self) -> bool {
        self.missed_deadline
    }

    /// Returns `false` for soft-deleted subtasks.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns `true` while the subtask is on hold.
    #[must_use]
    pub const fn on_hold(&self) -> bool {
        self.on_hold
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets the status.
    pub fn set_status(&mut self, status: TaskStatus, clock: &impl Clock) {
        self.status = status;
        self.updated_at = clock.utc();
    }

    /// Applies the field changes of `edit`.
    pub fn apply_edit(&mut self, edit: SubtaskEdit, clock: &impl Clock) {
        let SubtaskEdit {
            name,
            description,
            schedule,
            assignee_id,
            priority,
            priority_flag,
            on_hold,
            is_active,
        } = edit;
        if let Some(value) = name {
            self.name = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(value) = schedule {
            self.schedule = value;
        }
        if let Some(value) = assignee_id {
            self.assignee_id = value;
        }
        if let Some(value) = priority {
            self.priority = value;
        }
        if let Some(value) = priority_flag {
            self.priority_flag = value;
        }
        if let Some(value) = on_hold {
            self.on_hold = value;
        }
        if let Some(value) = is_active {
            self.is_active = value;
        }
        self.updated_at = clock.utc();
    }
}

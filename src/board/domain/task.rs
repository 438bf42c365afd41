//! Task aggregate root and the values it is built from.

use super::{Priority, PriorityFlag, ProjectId, TaskDomainError, TaskId, TaskStatus, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Start and deadline timestamps of a task or subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    starts_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
}

impl Schedule {
    /// Creates a validated schedule.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DeadlineBeforeStart`] when `deadline`
    /// precedes `starts_at`.
    pub fn new(starts_at: DateTime<Utc>, deadline: DateTime<Utc>) -> Result<Self, TaskDomainError> {
        if deadline < starts_at {
            return Err(TaskDomainError::DeadlineBeforeStart);
        }
        Ok(Self {
            starts_at,
            deadline,
        })
    }

    /// Returns the start timestamp.
    #[must_use]
    pub const fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Returns the UTC calendar day the work starts on.
    #[must_use]
    pub fn start_day(&self) -> NaiveDate {
        self.starts_at.date_naive()
    }

    /// Returns a copy with a new deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DeadlineBeforeStart`] when the new deadline
    /// precedes the start.
    pub fn with_deadline(self, deadline: DateTime<Utc>) -> Result<Self, TaskDomainError> {
        Self::new(self.starts_at, deadline)
    }
}

/// Validated, trimmed task or subtask name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Creates a task name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskName`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTaskName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validated input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Owning project.
    pub project_id: ProjectId,
    /// User the task is assigned to.
    pub assignee_id: UserId,
    /// Task name.
    pub name: TaskName,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Start and deadline.
    pub schedule: Schedule,
    /// Task priority.
    pub priority: Priority,
    /// Board pinning flag.
    pub priority_flag: PriorityFlag,
}

/// Optional field changes applied by a task edit.
///
/// Status is deliberately absent: it only changes through a board move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    /// New name.
    pub name: Option<TaskName>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New pinning flag.
    pub priority_flag: Option<PriorityFlag>,
    /// New on-hold flag.
    pub on_hold: Option<bool>,
    /// New active flag.
    pub is_active: Option<bool>,
}

impl TaskEdit {
    /// Returns `true` when the edit changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.priority_flag.is_none()
            && self.on_hold.is_none()
            && self.is_active.is_none()
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
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

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted project reference.
    pub project_id: ProjectId,
    /// Persisted assignee reference.
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

impl Task {
    /// Creates a new task in [`TaskStatus::Todo`].
    #[must_use]
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            project_id: draft.project_id,
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

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
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

    /// Creates a copy of this task for a new assignee and schedule.
    ///
    /// The copy starts in [`TaskStatus::Todo`] without a pinning flag and
    /// keeps project, description and priority.
    #[must_use]
    pub fn duplicate(
        &self,
        assignee_id: UserId,
        schedule: Schedule,
        name_suffix: &str,
        clock: &impl Clock,
    ) -> Self {
        let name = TaskName(format!("{}{name_suffix}", self.name.as_str()));
        Self::new(
            TaskDraft {
                project_id: self.project_id,
                assignee_id,
                name,
                description: self.description.clone(),
                schedule,
                priority: self.priority,
                priority_flag: PriorityFlag::NoPriority,
            },
            clock,
        )
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
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

    /// Returns the task name.
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

    /// Returns the status, which is also the task's board column.
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

    /// Returns `true` once the deadline sweep has flagged the task.
    #[must_use]
    pub const fn missed_deadline(&self) -> bool {
        self.missed_deadline
    }

    /// Returns `false` for soft-deleted tasks.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns `true` while the task is on hold.
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

    /// Returns `true` while the task counts toward its assignee's daily
    /// task limit.
    #[must_use]
    pub const fn counts_toward_daily_limit(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Returns `true` when the deadline has passed at `now` or the sweep has
    /// already flagged the task.
    #[must_use]
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.missed_deadline || now > self.schedule.deadline()
    }

    /// Checks a status change against the transition guard without
    /// mutating the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the guard rejects
    /// the move.
    pub const fn check_transition(&self, target: TaskStatus) -> Result<(), TaskDomainError> {
        if self.status.can_transition_to(target) {
            Ok(())
        } else {
            Err(TaskDomainError::InvalidTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            })
        }
    }

    /// Moves the task to `target`, returning the previous status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] when the guard rejects
    /// the move; the task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<TaskStatus, TaskDomainError> {
        self.check_transition(target)?;
        let previous = self.status;
        self.status = target;
        self.touch(clock);
        Ok(previous)
    }

    /// Replaces the deadline.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DeadlineBeforeStart`] when the deadline
    /// precedes the start.
    pub fn reschedule(
        &mut self,
        deadline: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.schedule = self.schedule.with_deadline(deadline)?;
        self.touch(clock);
        Ok(())
    }

    /// Applies the non-status field changes of `edit`.
    pub fn apply_edit(&mut self, edit: TaskEdit, clock: &impl Clock) {
        if edit.is_empty() {
            return;
        }
        let TaskEdit {
            name,
            description,
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
        self.touch(clock);
    }

    /// Flags the task when it is being worked on past its deadline.
    ///
    /// Only tasks in [`TaskStatus::InProgress`] or [`TaskStatus::InChanges`]
    /// are flagged, and only once. Returns `true` when the flag was set by
    /// this call.
    pub fn flag_missed_deadline(&mut self, now: DateTime<Utc>) -> bool {
        let in_flight = matches!(self.status, TaskStatus::InProgress | TaskStatus::InChanges);
        if !in_flight || self.missed_deadline || now <= self.schedule.deadline() {
            return false;
        }
        self.missed_deadline = true;
        self.updated_at = now;
        true
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

//! Diesel row models and their conversions to domain values.

use super::schema::{subtasks, task_status_log, tasks, user_task_positions, users};
use crate::board::{
    domain::{
        ParseUserRoleError, PersistedSubtaskData, PersistedTaskData, Placement, Position,
        Priority, PriorityFlag, ProjectId, Schedule, StatusLogEntry, StatusLogEntryId, Subtask,
        SubtaskId, Task, TaskId, TaskName, TaskStatus, UserId, UserProfile, UserRole,
    },
    ports::{BoardStoreError, BoardStoreResult},
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Task registry row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Assignee.
    pub assignee_id: uuid::Uuid,
    /// Task name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// Deadline.
    pub deadline: DateTime<Utc>,
    /// Status literal.
    pub status: String,
    /// Priority literal.
    pub priority: String,
    /// Pinning flag literal.
    pub priority_flag: String,
    /// Missed-deadline flag.
    pub missed_deadline: bool,
    /// Soft-delete flag.
    pub is_active: bool,
    /// On-hold flag.
    pub on_hold: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Subtask registry row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = subtasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct SubtaskRow {
    /// Subtask identifier.
    pub id: uuid::Uuid,
    /// Parent task.
    pub task_id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Assignee.
    pub assignee_id: uuid::Uuid,
    /// Subtask name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// Deadline.
    pub deadline: DateTime<Utc>,
    /// Status literal.
    pub status: String,
    /// Priority literal.
    pub priority: String,
    /// Pinning flag literal.
    pub priority_flag: String,
    /// Missed-deadline flag.
    pub missed_deadline: bool,
    /// Soft-delete flag.
    pub is_active: bool,
    /// On-hold flag.
    pub on_hold: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Board placement row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_task_positions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlacementRow {
    /// Board owner.
    pub user_id: uuid::Uuid,
    /// Task on the card.
    pub task_id: uuid::Uuid,
    /// Column literal.
    pub board_column: String,
    /// One-based rank.
    pub position: i32,
}

/// Status log row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_status_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StatusLogRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Task that moved.
    pub task_id: uuid::Uuid,
    /// User who moved it.
    pub actor_id: uuid::Uuid,
    /// Actor name snapshot.
    pub actor_name: String,
    /// Status before the move.
    pub status_before: String,
    /// Status after the move.
    pub status_after: String,
    /// Whether the move happened past the deadline.
    pub missed_deadline: bool,
    /// Commit timestamp.
    pub recorded_at: DateTime<Utc>,
}

/// User directory row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: uuid::Uuid,
    /// Display name.
    pub display_name: String,
    /// Role literal.
    pub role: String,
}

pub(super) fn task_to_row(task: &Task) -> TaskRow {
    let schedule = task.schedule();
    TaskRow {
        id: task.id().into_inner(),
        project_id: task.project_id().into_inner(),
        assignee_id: task.assignee_id().into_inner(),
        name: task.name().as_str().to_owned(),
        description: task.description().map(str::to_owned),
        starts_at: schedule.starts_at(),
        deadline: schedule.deadline(),
        status: task.status().as_str().to_owned(),
        priority: task.priority().as_str().to_owned(),
        priority_flag: task.priority_flag().as_str().to_owned(),
        missed_deadline: task.missed_deadline(),
        is_active: task.is_active(),
        on_hold: task.on_hold(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    }
}

pub(super) fn row_to_task(row: TaskRow) -> BoardStoreResult<Task> {
    let TaskRow {
        id,
        project_id,
        assignee_id,
        name,
        description,
        starts_at,
        deadline,
        status,
        priority,
        priority_flag,
        missed_deadline,
        is_active,
        on_hold,
        created_at,
        updated_at,
    } = row;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        project_id: ProjectId::from_uuid(project_id),
        assignee_id: UserId::from_uuid(assignee_id),
        name: TaskName::new(name).map_err(BoardStoreError::persistence)?,
        description,
        schedule: Schedule::new(starts_at, deadline).map_err(BoardStoreError::persistence)?,
        status: parse_status(&status)?,
        priority: Priority::try_from(priority.as_str()).map_err(BoardStoreError::persistence)?,
        priority_flag: PriorityFlag::try_from(priority_flag.as_str())
            .map_err(BoardStoreError::persistence)?,
        missed_deadline,
        is_active,
        on_hold,
        created_at,
        updated_at,
    }))
}

pub(super) fn subtask_to_row(subtask: &Subtask) -> SubtaskRow {
    let schedule = subtask.schedule();
    SubtaskRow {
        id: subtask.id().into_inner(),
        task_id: subtask.task_id().into_inner(),
        project_id: subtask.project_id().into_inner(),
        assignee_id: subtask.assignee_id().into_inner(),
        name: subtask.name().as_str().to_owned(),
        description: subtask.description().map(str::to_owned),
        starts_at: schedule.starts_at(),
        deadline: schedule.deadline(),
        status: subtask.status().as_str().to_owned(),
        priority: subtask.priority().as_str().to_owned(),
        priority_flag: subtask.priority_flag().as_str().to_owned(),
        missed_deadline: subtask.missed_deadline(),
        is_active: subtask.is_active(),
        on_hold: subtask.on_hold(),
        created_at: subtask.created_at(),
        updated_at: subtask.updated_at(),
    }
}

pub(super) fn row_to_subtask(row: SubtaskRow) -> BoardStoreResult<Subtask> {
    let SubtaskRow {
        id,
        task_id,
        project_id,
        assignee_id,
        name,
        description,
        starts_at,
        deadline,
        status,
        priority,
        priority_flag,
        missed_deadline,
        is_active,
        on_hold,
        created_at,
        updated_at,
    } = row;

    Ok(Subtask::from_persisted(PersistedSubtaskData {
        id: SubtaskId::from_uuid(id),
        task_id: TaskId::from_uuid(task_id),
        project_id: ProjectId::from_uuid(project_id),
        assignee_id: UserId::from_uuid(assignee_id),
        name: TaskName::new(name).map_err(BoardStoreError::persistence)?,
        description,
        schedule: Schedule::new(starts_at, deadline).map_err(BoardStoreError::persistence)?,
        status: parse_status(&status)?,
        priority: Priority::try_from(priority.as_str()).map_err(BoardStoreError::persistence)?,
        priority_flag: PriorityFlag::try_from(priority_flag.as_str())
            .map_err(BoardStoreError::persistence)?,
        missed_deadline,
        is_active,
        on_hold,
        created_at,
        updated_at,
    }))
}

pub(super) fn placement_to_row(placement: &Placement) -> BoardStoreResult<PlacementRow> {
    Ok(PlacementRow {
        user_id: placement.user_id.into_inner(),
        task_id: placement.task_id.into_inner(),
        board_column: placement.column.as_str().to_owned(),
        position: i32::try_from(placement.position.value())
            .map_err(BoardStoreError::persistence)?,
    })
}

pub(super) fn row_to_placement(row: &PlacementRow) -> BoardStoreResult<Placement> {
    let raw_position = u64::try_from(row.position).map_err(BoardStoreError::persistence)?;
    Ok(Placement::new(
        UserId::from_uuid(row.user_id),
        TaskId::from_uuid(row.task_id),
        parse_status(&row.board_column)?,
        Position::new(raw_position).map_err(BoardStoreError::persistence)?,
    ))
}

pub(super) fn status_log_to_row(entry: &StatusLogEntry) -> StatusLogRow {
    StatusLogRow {
        id: entry.id.into_inner(),
        task_id: entry.task_id.into_inner(),
        actor_id: entry.actor_id.into_inner(),
        actor_name: entry.actor_name.clone(),
        status_before: entry.status_before.as_str().to_owned(),
        status_after: entry.status_after.as_str().to_owned(),
        missed_deadline: entry.missed_deadline,
        recorded_at: entry.recorded_at,
    }
}

pub(super) fn row_to_status_log(row: StatusLogRow) -> BoardStoreResult<StatusLogEntry> {
    Ok(StatusLogEntry {
        id: StatusLogEntryId::from_uuid(row.id),
        task_id: TaskId::from_uuid(row.task_id),
        actor_id: UserId::from_uuid(row.actor_id),
        actor_name: row.actor_name,
        status_before: parse_status(&row.status_before)?,
        status_after: parse_status(&row.status_after)?,
        missed_deadline: row.missed_deadline,
        recorded_at: row.recorded_at,
    })
}

pub(super) fn row_to_profile(row: UserRow) -> Result<UserProfile, ParseUserRoleError> {
    let role = UserRole::try_from(row.role.as_str())?;
    Ok(UserProfile::new(UserId::from_uuid(row.id), row.display_name, role))
}

pub(super) fn profile_to_row(profile: &UserProfile) -> UserRow {
    UserRow {
        id: profile.id.into_inner(),
        display_name: profile.display_name.clone(),
        role: profile.role.as_str().to_owned(),
    }
}

fn parse_status(value: &str) -> BoardStoreResult<TaskStatus> {
    TaskStatus::try_from(value).map_err(BoardStoreError::persistence)
}

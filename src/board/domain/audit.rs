//! Append-only status audit records.

use super::{StatusLogEntryId, TaskId, TaskStatus, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Display name recorded when the directory has no record of the actor.
pub const UNKNOWN_ACTOR_NAME: &str = "Unknown";

/// One accepted status transition.
///
/// Entries are written once, in the same atomic unit as the move they
/// describe, and never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLogEntry {
    /// Entry identifier.
    pub id: StatusLogEntryId,
    /// Task that moved.
    pub task_id: TaskId,
    /// User who moved it.
    pub actor_id: UserId,
    /// Actor's display name at the time of the move.
    pub actor_name: String,
    /// Status before the move.
    pub status_before: TaskStatus,
    /// Status after the move.
    pub status_after: TaskStatus,
    /// Whether the move happened past the task's deadline.
    pub missed_deadline: bool,
    /// When the move was committed.
    pub recorded_at: DateTime<Utc>,
}

/// Inputs of a [`StatusLogEntry`] other than its identifier and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    /// Task that moved.
    pub task_id: TaskId,
    /// User who moved it.
    pub actor_id: UserId,
    /// Actor's display name.
    pub actor_name: String,
    /// Status before the move.
    pub status_before: TaskStatus,
    /// Status after the move.
    pub status_after: TaskStatus,
    /// Whether the move happened past the task's deadline.
    pub missed_deadline: bool,
}

impl StatusLogEntry {
    /// Records a status change at the current clock time.
    #[must_use]
    pub fn record(change: StatusChange, clock: &impl Clock) -> Self {
        Self {
            id: StatusLogEntryId::new(),
            task_id: change.task_id,
            actor_id: change.actor_id,
            actor_name: change.actor_name,
            status_before: change.status_before,
            status_after: change.status_after,
            missed_deadline: change.missed_deadline,
            recorded_at: clock.utc(),
        }
    }
}

/// Orders entries newest first, breaking timestamp ties by identifier so the
/// order is stable.
pub fn sort_newest_first(entries: &mut [StatusLogEntry]) {
    entries.sort_by(|left, right| {
        right
            .recorded_at
            .cmp(&left.recorded_at)
            .then_with(|| right.id.cmp(&left.id))
    });
}

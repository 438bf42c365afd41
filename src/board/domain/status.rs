//! Task status values, which double as Kanban board columns, and the
//! transition guard over them.

use super::{ParsePriorityError, ParseTaskStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// Every status is also the name of one Kanban column, so the same type is
/// used for the status field of a task and for the column of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Work has not started.
    Todo,
    /// Task is being worked on.
    InProgress,
    /// Task is awaiting review.
    InReview,
    /// Review requested changes.
    InChanges,
    /// Task is finished. Terminal.
    Completed,
}

impl TaskStatus {
    /// Every status in board display order.
    pub const ALL: [Self; 5] = [
        Self::Todo,
        Self::InProgress,
        Self::InReview,
        Self::InChanges,
        Self::Completed,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::InReview => "in_review",
            Self::InChanges => "in_changes",
            Self::Completed => "completed",
        }
    }

    /// Returns `true` when no transition may leave this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` when a task in this status may be moved to `target`.
    ///
    /// The guard fails closed only on named rules; any pair not listed is
    /// legal:
    ///
    /// - nothing leaves [`TaskStatus::Completed`],
    /// - only a task still in [`TaskStatus::Todo`] may be placed in `Todo`,
    /// - [`TaskStatus::InReview`] may not regress to
    ///   [`TaskStatus::InProgress`].
    ///
    /// A move within the current column (a reorder) is checked like any other
    /// move, so `Todo -> Todo` is legal and `Completed -> Completed` is not.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Completed, _) => false,
            (Self::Todo, Self::Todo) => true,
            (_, Self::Todo) => false,
            (Self::InReview, Self::InProgress) => false,
            _ => true,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    /// Parses a column literal.
    ///
    /// Matching ignores case, surrounding whitespace, underscores and hyphens,
    /// so `"InProgress"`, `"in_progress"` and `"in-progress"` are equivalent.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "inreview" => Ok(Self::InReview),
            "inchanges" => Ok(Self::InChanges),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Default priority.
    #[default]
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
    /// Urgent priority.
    Urgent,
}

impl Priority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

/// Board pinning flag.
///
/// Flagged tasks sort ahead of unflagged ones within a column. The derived
/// ordering puts [`PriorityFlag::Priority`] first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PriorityFlag {
    /// Pinned to the top of its column.
    Priority,
    /// Ordered by position only.
    #[default]
    NoPriority,
}

impl PriorityFlag {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::NoPriority => "no_priority",
        }
    }
}

impl TryFrom<&str> for PriorityFlag {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "priority" => Ok(Self::Priority),
            "nopriority" => Ok(Self::NoPriority),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

//! Board positions and placements.

use super::{TaskDomainError, TaskId, TaskStatus, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One-based rank of a card within a user's board column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(u32);

impl Position {
    /// The top slot of a column.
    pub const FIRST: Self = Self(1);

    /// Largest position representable in the `PostgreSQL` schema.
    const MAX_PERSISTED_VALUE: u64 = i32::MAX as u64;

    /// Creates a validated position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPosition`] when the value is zero or
    /// exceeds the schema-backed maximum (`i32::MAX`).
    pub fn new(value: u64) -> Result<Self, TaskDomainError> {
        if value == 0 || value > Self::MAX_PERSISTED_VALUE {
            return Err(TaskDomainError::InvalidPosition(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| TaskDomainError::InvalidPosition(value))
    }

    /// Returns the underlying one-based value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the next slot down the column.
    #[must_use]
    pub const fn succ(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the previous slot up the column, never above the first.
    #[must_use]
    pub const fn pred(self) -> Self {
        if self.0 <= 1 { Self::FIRST } else { Self(self.0 - 1) }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task card on one user's board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Board owner.
    pub user_id: UserId,
    /// Task shown on the card.
    pub task_id: TaskId,
    /// Column the card sits in.
    pub column: TaskStatus,
    /// Rank within the column.
    pub position: Position,
}

impl Placement {
    /// Creates a placement.
    #[must_use]
    pub const fn new(
        user_id: UserId,
        task_id: TaskId,
        column: TaskStatus,
        position: Position,
    ) -> Self {
        Self {
            user_id,
            task_id,
            column,
            position,
        }
    }
}

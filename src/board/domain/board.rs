//! Read model of one user's Kanban board.

use super::{Placement, Position, Priority, PriorityFlag, ProjectId, Task, TaskId, TaskStatus, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A placement joined with the task it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    /// The card's slot on the owner's board.
    pub placement: Placement,
    /// The task shown on the card.
    pub task: Task,
}

/// Restricts which cards a board read returns.
///
/// Both date bounds are inclusive whole UTC days compared against the task
/// start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFilter {
    /// Earliest start day shown.
    pub start_from: Option<NaiveDate>,
    /// Latest start day shown.
    pub start_until: Option<NaiveDate>,
    /// Only tasks of this project.
    pub project_id: Option<ProjectId>,
}

impl BoardFilter {
    /// Returns `true` when `task` passes the filter.
    #[must_use]
    pub fn accepts(&self, task: &Task) -> bool {
        let day = task.schedule().start_day();
        self.start_from.is_none_or(|from| day >= from)
            && self.start_until.is_none_or(|until| day <= until)
            && self
                .project_id
                .is_none_or(|project_id| task.project_id() == project_id)
    }
}

/// Task summary shown on a board card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCard {
    /// Task shown on the card.
    pub task_id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Task assignee.
    pub assignee_id: UserId,
    /// Task name.
    pub name: String,
    /// Task description.
    pub description: Option<String>,
    /// Task priority.
    pub priority: Priority,
    /// Pinning flag.
    pub priority_flag: PriorityFlag,
    /// Deadline.
    pub deadline: DateTime<Utc>,
    /// Missed-deadline flag.
    pub missed_deadline: bool,
    /// Rank within the owner's column.
    pub position: Position,
}

impl BoardCard {
    fn from_entry(entry: &BoardEntry) -> Self {
        let task = &entry.task;
        Self {
            task_id: task.id(),
            project_id: task.project_id(),
            assignee_id: task.assignee_id(),
            name: task.name().as_str().to_owned(),
            description: task.description().map(str::to_owned),
            priority: task.priority(),
            priority_flag: task.priority_flag(),
            deadline: task.schedule().deadline(),
            missed_deadline: task.missed_deadline(),
            position: entry.placement.position,
        }
    }
}

/// One column of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    /// Column status.
    pub status: TaskStatus,
    /// Cards, pinned first, then by position.
    pub cards: Vec<BoardCard>,
}

/// A user's board: all five columns, always present, in workflow order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanbanBoard {
    /// Board owner.
    pub user_id: UserId,
    /// Columns in [`TaskStatus::ALL`] order.
    pub columns: Vec<BoardColumn>,
}

impl KanbanBoard {
    /// Builds the board of `user_id` from its joined entries.
    ///
    /// Entries owned by other users and entries rejected by `filter` are
    /// dropped.
    #[must_use]
    pub fn assemble(user_id: UserId, entries: &[BoardEntry], filter: &BoardFilter) -> Self {
        let columns = TaskStatus::ALL
            .into_iter()
            .map(|status| {
                let mut cards: Vec<BoardCard> = entries
                    .iter()
                    .filter(|entry| {
                        entry.placement.user_id == user_id
                            && entry.placement.column == status
                            && filter.accepts(&entry.task)
                    })
                    .map(BoardCard::from_entry)
                    .collect();
                cards.sort_by_key(|card| (card.priority_flag, card.position, card.task_id));
                BoardColumn { status, cards }
            })
            .collect();
        Self { user_id, columns }
    }

    /// Returns the column for `status`.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> &[BoardCard] {
        self.columns
            .iter()
            .find(|column| column.status == status)
            .map_or(&[], |column| column.cards.as_slice())
    }

    /// Returns the total number of cards.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|column| column.cards.len()).sum()
    }
}

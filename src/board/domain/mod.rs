//! Domain model for the task board.
//!
//! Tasks, their per-user board placements, the transition guard, the
//! stakeholder fanout and the status audit trail. Everything here is pure:
//! infrastructure stays behind the ports.

mod audit;
mod board;
mod error;
mod fanout;
mod ids;
mod ledger;
mod placement;
mod status;
mod subtask;
mod task;
mod user;

pub use audit::{StatusChange, StatusLogEntry, UNKNOWN_ACTOR_NAME, sort_newest_first};
pub use board::{BoardCard, BoardColumn, BoardEntry, BoardFilter, KanbanBoard};
pub use error::{ParsePriorityError, ParseTaskStatusError, ParseUserRoleError, TaskDomainError};
pub use fanout::{PrivilegedRoles, Stakeholders};
pub use ids::{ProjectId, StatusLogEntryId, SubtaskId, TaskId, UserId};
pub use ledger::{LedgerMove, MoveOutcome, PositionLedger, SeedPolicy, UserBoard};
pub use placement::{Placement, Position};
pub use status::{Priority, PriorityFlag, TaskStatus};
pub use subtask::{PersistedSubtaskData, Subtask, SubtaskDraft, SubtaskEdit};
pub use task::{PersistedTaskData, Schedule, Task, TaskDraft, TaskEdit, TaskName};
pub use user::{UserProfile, UserRole};

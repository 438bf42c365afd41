//! Application services for the task board.

mod board;
mod deadline;
mod error;
mod requests;
mod subtask;

pub use board::{BatchCreateOutcome, SkipReason, SkippedTask, TaskBoardService};
pub use deadline::DeadlineSweepService;
pub use error::{TaskBoardError, TaskBoardResult};
pub use requests::{
    CreateSubtaskRequest, CreateTaskRequest, DuplicateTaskRequest, MoveTaskRequest,
};
pub use subtask::SubtaskService;

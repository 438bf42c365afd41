//! In-memory adapters for tests and single-process embedders.

mod directory;
mod store;
mod subtask;

pub use directory::InMemoryUserDirectory;
pub use store::{BoardSnapshot, InMemoryBoardStore};
pub use subtask::InMemorySubtaskRepository;

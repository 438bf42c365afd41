//! Port contracts for the task board.
//!
//! Ports define infrastructure-agnostic interfaces used by board services.

pub mod directory;
pub mod store;
pub mod subtask;

pub use directory::{DirectoryError, DirectoryResult, UserDirectory};
pub use store::{BoardStore, BoardStoreError, BoardStoreResult, BoardTransaction};
pub use subtask::SubtaskRepository;

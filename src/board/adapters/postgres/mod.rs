//! `PostgreSQL` adapters for the task board.

mod blocking;
mod directory;
mod models;
mod schema;
mod store;
mod subtask;

pub use blocking::BoardPgPool;
pub use directory::PostgresUserDirectory;
pub use store::PostgresBoardStore;
pub use subtask::PostgresSubtaskRepository;

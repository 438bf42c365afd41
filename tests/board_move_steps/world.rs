//! Shared world state for board move BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::DefaultClock;
use rstest::fixture;
use taskboard::board::{
    adapters::memory::{InMemoryBoardStore, InMemoryUserDirectory},
    domain::{LedgerMove, Placement, ProjectId, Task, TaskStatus, UserId},
    services::{CreateTaskRequest, TaskBoardError, TaskBoardService},
};

/// Service type used by the BDD world.
pub type TestBoardService =
    TaskBoardService<InMemoryBoardStore, InMemoryUserDirectory, DefaultClock>;

/// Scenario world for board move behaviour tests.
pub struct BoardMoveWorld {
    pub store: Arc<InMemoryBoardStore>,
    pub directory: Arc<InMemoryUserDirectory>,
    pub service: TestBoardService,
    pub users: HashMap<String, UserId>,
    pub tasks: Vec<Task>,
    pub last_move: Option<Result<LedgerMove, TaskBoardError>>,
    pub last_create: Option<Result<Task, TaskBoardError>>,
}

impl BoardMoveWorld {
    /// Creates a world with an empty store and directory.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryBoardStore::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        let service = TaskBoardService::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::new(DefaultClock),
        );
        Self {
            store,
            directory,
            service,
            users: HashMap::new(),
            tasks: Vec::new(),
            last_move: None,
            last_create: None,
        }
    }

    /// Resolves a scenario user name.
    ///
    /// # Errors
    ///
    /// Returns an error when the name was never registered.
    pub fn user(&self, name: &str) -> Result<UserId, eyre::Report> {
        self.users
            .get(name)
            .copied()
            .ok_or_else(|| eyre::eyre!("unknown scenario user {name}"))
    }

    /// Resolves a 1-based scenario task number.
    ///
    /// # Errors
    ///
    /// Returns an error when no such task was created.
    pub fn task(&self, number: usize) -> Result<&Task, eyre::Report> {
        number
            .checked_sub(1)
            .and_then(|index| self.tasks.get(index))
            .ok_or_else(|| eyre::eyre!("scenario has no task {number}"))
    }

    /// Returns the committed placement of a task on a user's board.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub fn placement(
        &self,
        owner: UserId,
        number: usize,
    ) -> Result<Option<Placement>, eyre::Report> {
        let task_id = self.task(number)?.id();
        Ok(self
            .store
            .snapshot()?
            .placements
            .into_iter()
            .find(|entry| entry.user_id == owner && entry.task_id == task_id))
    }

    /// Returns every committed placement.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    pub fn placements(&self) -> Result<Vec<Placement>, eyre::Report> {
        Ok(self.store.snapshot()?.placements)
    }
}

impl Default for BoardMoveWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> BoardMoveWorld {
    BoardMoveWorld::default()
}

/// Builds a creation request starting `offset` days after the base day.
#[must_use]
pub fn task_request(assignee: UserId, name: &str, offset: i64) -> CreateTaskRequest {
    let starts_at: DateTime<Utc> = Utc
        .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
        + Duration::days(offset);
    CreateTaskRequest::new(
        ProjectId::new(),
        assignee,
        name,
        starts_at,
        starts_at + Duration::hours(8),
    )
}

/// Parses a column literal used in a scenario.
///
/// # Errors
///
/// Returns an error for an unknown column.
pub fn column(literal: &str) -> Result<TaskStatus, eyre::Report> {
    TaskStatus::try_from(literal).map_err(|err| eyre::eyre!("invalid scenario column: {err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

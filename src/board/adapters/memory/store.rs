//! In-memory board store for tests and embedders.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::board::{
    domain::{BoardEntry, Placement, StatusLogEntry, Task, TaskId, UserBoard, UserId},
    ports::{BoardStore, BoardStoreError, BoardStoreResult, BoardTransaction},
};

/// Thread-safe in-memory board store.
///
/// A single lock guards the whole state, so units of work are serialized.
/// Each unit runs against a staged copy that replaces the published state
/// only when the unit succeeds.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardStore {
    state: Arc<Mutex<BoardState>>,
}

#[derive(Debug, Clone, Default)]
struct BoardState {
    tasks: HashMap<TaskId, Task>,
    placements: BTreeMap<(UserId, TaskId), Placement>,
    status_log: Vec<StatusLogEntry>,
}

/// Point-in-time copy of every record held by an [`InMemoryBoardStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    /// Tasks ordered by identifier.
    pub tasks: Vec<Task>,
    /// Placements ordered by owner, then task.
    pub placements: Vec<Placement>,
    /// Status log in insertion order.
    pub status_log: Vec<StatusLogEntry>,
}

impl InMemoryBoardStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the committed state.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::Persistence`] when the state lock is
    /// poisoned.
    pub fn snapshot(&self) -> BoardStoreResult<BoardSnapshot> {
        let state = self.lock()?;
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by_key(Task::id);
        Ok(BoardSnapshot {
            tasks,
            placements: state.placements.values().copied().collect(),
            status_log: state.status_log.clone(),
        })
    }

    /// Writes a placement as is, bypassing the ledger.
    ///
    /// Used to import boards kept elsewhere; the caller is responsible for
    /// the resulting ordering.
    ///
    /// # Errors
    ///
    /// Returns [`BoardStoreError::TaskNotFound`] when the task is unknown.
    pub fn put_placement(&self, placement: Placement) -> BoardStoreResult<()> {
        let mut state = self.lock()?;
        if !state.tasks.contains_key(&placement.task_id) {
            return Err(BoardStoreError::TaskNotFound(placement.task_id));
        }
        state
            .placements
            .insert((placement.user_id, placement.task_id), placement);
        Ok(())
    }

    fn lock(&self) -> BoardStoreResult<MutexGuard<'_, BoardState>> {
        self.state.lock().map_err(poisoned)
    }

    fn run_unit<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BoardTransaction) -> Result<T, E>,
        E: From<BoardStoreError>,
    {
        let mut published = self.lock()?;
        let mut staged = MemoryTransaction {
            state: published.clone(),
        };
        let value = work(&mut staged)?;
        *published = staged.state;
        Ok(value)
    }
}

fn poisoned<T>(err: PoisonError<T>) -> BoardStoreError {
    BoardStoreError::persistence(std::io::Error::other(err.to_string()))
}

fn user_board(state: &BoardState, user_id: UserId) -> BoardStoreResult<UserBoard> {
    let placements = state
        .placements
        .values()
        .filter(|placement| placement.user_id == user_id)
        .copied();
    UserBoard::from_placements(user_id, placements).map_err(BoardStoreError::persistence)
}

struct MemoryTransaction {
    state: BoardState,
}

impl BoardTransaction for MemoryTransaction {
    fn find_task(&mut self, task_id: TaskId) -> BoardStoreResult<Option<Task>> {
        Ok(self.state.tasks.get(&task_id).cloned())
    }

    fn lock_task(&mut self, task_id: TaskId) -> BoardStoreResult<Option<Task>> {
        self.find_task(task_id)
    }

    fn insert_task(&mut self, task: &Task) -> BoardStoreResult<()> {
        if self.state.tasks.contains_key(&task.id()) {
            return Err(BoardStoreError::DuplicateTask(task.id()));
        }
        self.state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    fn update_task(&mut self, task: &Task) -> BoardStoreResult<()> {
        let stored = self
            .state
            .tasks
            .get_mut(&task.id())
            .ok_or(BoardStoreError::TaskNotFound(task.id()))?;
        *stored = task.clone();
        Ok(())
    }

    fn count_open_tasks_on(&mut self, assignee: UserId, day: NaiveDate) -> BoardStoreResult<u32> {
        let count = self
            .state
            .tasks
            .values()
            .filter(|task| {
                task.assignee_id() == assignee
                    && task.schedule().start_day() == day
                    && task.counts_toward_daily_limit()
            })
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn lock_board(&mut self, user_id: UserId) -> BoardStoreResult<UserBoard> {
        user_board(&self.state, user_id)
    }

    fn placement_holders(&mut self, task_id: TaskId) -> BoardStoreResult<Vec<UserId>> {
        Ok(self
            .state
            .placements
            .keys()
            .filter(|(_, held)| *held == task_id)
            .map(|(owner, _)| *owner)
            .collect())
    }

    fn save_board(&mut self, board: &UserBoard) -> BoardStoreResult<()> {
        for placement in board.changes() {
            self.state
                .placements
                .insert((placement.user_id, placement.task_id), placement);
        }
        Ok(())
    }

    fn append_status_log(&mut self, entry: &StatusLogEntry) -> BoardStoreResult<()> {
        self.state.status_log.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl BoardStore for InMemoryBoardStore {
    async fn transact<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BoardTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<BoardStoreError> + Send + 'static,
    {
        self.run_unit(work)
    }

    async fn find_task(&self, task_id: TaskId) -> BoardStoreResult<Option<Task>> {
        Ok(self.lock()?.tasks.get(&task_id).cloned())
    }

    async fn load_board(&self, user_id: UserId) -> BoardStoreResult<UserBoard> {
        user_board(&*self.lock()?, user_id)
    }

    async fn board_entries(&self, user_id: UserId) -> BoardStoreResult<Vec<BoardEntry>> {
        let state = self.lock()?;
        Ok(state
            .placements
            .values()
            .filter(|placement| placement.user_id == user_id)
            .filter_map(|placement| {
                state.tasks.get(&placement.task_id).map(|task| BoardEntry {
                    placement: *placement,
                    task: task.clone(),
                })
            })
            .collect())
    }

    async fn status_log(&self, task_id: TaskId) -> BoardStoreResult<Vec<StatusLogEntry>> {
        Ok(self
            .lock()?
            .status_log
            .iter()
            .filter(|entry| entry.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn mark_missed_deadlines(&self, now: DateTime<Utc>) -> BoardStoreResult<u64> {
        let mut state = self.lock()?;
        let flagged = state
            .tasks
            .values_mut()
            .map(|task| task.flag_missed_deadline(now))
            .filter(|flagged| *flagged)
            .count();
        Ok(u64::try_from(flagged).unwrap_or(u64::MAX))
    }
}

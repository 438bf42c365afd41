//! `PostgreSQL` board store.
//!
//! Each unit of work runs in one Diesel transaction on a blocking thread.
//! Board locks are transaction-scoped advisory locks keyed by user id.

use super::{
    blocking::{BlockingError, BoardPgPool, run_blocking},
    models::{
        PlacementRow, StatusLogRow, TaskRow, placement_to_row, row_to_placement,
        row_to_status_log, row_to_task, status_log_to_row, task_to_row,
    },
    schema::{task_status_log, tasks, user_task_positions},
};
use crate::board::{
    domain::{BoardEntry, StatusLogEntry, Task, TaskId, TaskStatus, UserBoard, UserId},
    ports::{BoardStore, BoardStoreError, BoardStoreResult, BoardTransaction},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Text;
use diesel::upsert::excluded;
use std::time::Duration;

/// Default bound on how long a unit waits for a board lock.
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// `PostgreSQL`-backed board store.
#[derive(Debug, Clone)]
pub struct PostgresBoardStore {
    pool: BoardPgPool,
    lock_timeout: Duration,
}

impl PostgresBoardStore {
    /// Creates a store from a connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Sets how long a unit waits for a board lock before failing with
    /// [`BoardStoreError::ConcurrencyConflict`].
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    async fn run_read<F, T>(&self, work: F) -> BoardStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BoardStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(&self.pool, blocking_failure, work).await
    }
}

fn blocking_failure(err: BlockingError) -> BoardStoreError {
    BoardStoreError::persistence(err)
}

/// Error carried out of a Diesel transaction closure.
enum UnitError<E> {
    Work(E),
    Database(DieselError),
}

impl<E> From<DieselError> for UnitError<E> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

/// Maps Diesel failures onto the store taxonomy.
fn map_diesel_error(err: DieselError) -> BoardStoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            BoardStoreError::ConcurrencyConflict
        }
        DieselError::DatabaseError(DatabaseErrorKind::Unknown, ref info)
            if is_lock_contention(info.as_ref()) =>
        {
            BoardStoreError::ConcurrencyConflict
        }
        other => BoardStoreError::persistence(other),
    }
}

/// Lock timeouts (55P03) and detected deadlocks (40P01) reach Diesel as
/// unclassified errors; only their server message tells them apart.
fn is_lock_contention(info: &dyn DatabaseErrorInformation) -> bool {
    let message = info.message();
    message.contains("lock timeout") || message.contains("deadlock detected")
}

struct PgBoardTransaction<'conn> {
    connection: &'conn mut PgConnection,
}

impl PgBoardTransaction<'_> {
    fn load_placements(&mut self, user_id: UserId) -> BoardStoreResult<UserBoard> {
        let rows = user_task_positions::table
            .filter(user_task_positions::user_id.eq(user_id.into_inner()))
            .select(PlacementRow::as_select())
            .load::<PlacementRow>(self.connection)
            .map_err(map_diesel_error)?;
        let placements = rows
            .iter()
            .map(row_to_placement)
            .collect::<BoardStoreResult<Vec<_>>>()?;
        UserBoard::from_placements(user_id, placements).map_err(BoardStoreError::persistence)
    }
}

impl BoardTransaction for PgBoardTransaction<'_> {
    fn find_task(&mut self, task_id: TaskId) -> BoardStoreResult<Option<Task>> {
        let row = tasks::table
            .find(task_id.into_inner())
            .select(TaskRow::as_select())
            .first::<TaskRow>(self.connection)
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_task).transpose()
    }

    fn lock_task(&mut self, task_id: TaskId) -> BoardStoreResult<Option<Task>> {
        let row = tasks::table
            .find(task_id.into_inner())
            .select(TaskRow::as_select())
            .for_update()
            .first::<TaskRow>(self.connection)
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_task).transpose()
    }

    fn insert_task(&mut self, task: &Task) -> BoardStoreResult<()> {
        let task_id = task.id();
        diesel::insert_into(tasks::table)
            .values(&task_to_row(task))
            .execute(self.connection)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    BoardStoreError::DuplicateTask(task_id)
                }
                other => map_diesel_error(other),
            })?;
        Ok(())
    }

    fn update_task(&mut self, task: &Task) -> BoardStoreResult<()> {
        let updated = diesel::update(tasks::table.find(task.id().into_inner()))
            .set(&task_to_row(task))
            .execute(self.connection)
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(BoardStoreError::TaskNotFound(task.id()));
        }
        Ok(())
    }

    fn count_open_tasks_on(&mut self, assignee: UserId, day: NaiveDate) -> BoardStoreResult<u32> {
        let day_start = day.and_time(NaiveTime::MIN).and_utc();
        let mut query = tasks::table
            .filter(tasks::assignee_id.eq(assignee.into_inner()))
            .filter(tasks::starts_at.ge(day_start))
            .filter(tasks::status.ne(TaskStatus::Completed.as_str()))
            .into_boxed();
        if let Some(next_day) = day.succ_opt() {
            query = query.filter(tasks::starts_at.lt(next_day.and_time(NaiveTime::MIN).and_utc()));
        }
        let count = query
            .count()
            .get_result::<i64>(self.connection)
            .map_err(map_diesel_error)?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn lock_board(&mut self, user_id: UserId) -> BoardStoreResult<UserBoard> {
        diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind::<Text, _>(user_id.to_string())
            .execute(self.connection)
            .map_err(map_diesel_error)?;
        self.load_placements(user_id)
    }

    fn placement_holders(&mut self, task_id: TaskId) -> BoardStoreResult<Vec<UserId>> {
        let owners = user_task_positions::table
            .filter(user_task_positions::task_id.eq(task_id.into_inner()))
            .order(user_task_positions::user_id.asc())
            .select(user_task_positions::user_id)
            .load::<uuid::Uuid>(self.connection)
            .map_err(map_diesel_error)?;
        Ok(owners.into_iter().map(UserId::from_uuid).collect())
    }

    fn save_board(&mut self, board: &UserBoard) -> BoardStoreResult<()> {
        let rows = board
            .changes()
            .iter()
            .map(placement_to_row)
            .collect::<BoardStoreResult<Vec<_>>>()?;
        if rows.is_empty() {
            return Ok(());
        }
        diesel::insert_into(user_task_positions::table)
            .values(&rows)
            .on_conflict((user_task_positions::user_id, user_task_positions::task_id))
            .do_update()
            .set((
                user_task_positions::board_column.eq(excluded(user_task_positions::board_column)),
                user_task_positions::position.eq(excluded(user_task_positions::position)),
            ))
            .execute(self.connection)
            .map_err(map_diesel_error)?;
        Ok(())
    }

    fn append_status_log(&mut self, entry: &StatusLogEntry) -> BoardStoreResult<()> {
        diesel::insert_into(task_status_log::table)
            .values(&status_log_to_row(entry))
            .execute(self.connection)
            .map_err(map_diesel_error)?;
        Ok(())
    }
}

#[async_trait]
impl BoardStore for PostgresBoardStore {
    async fn transact<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn BoardTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<BoardStoreError> + Send + 'static,
    {
        let timeout_ms = self.lock_timeout.as_millis();
        run_blocking(
            &self.pool,
            |err| E::from(BoardStoreError::persistence(err)),
            move |connection| {
                connection
                    .transaction::<T, UnitError<E>, _>(|conn| {
                        diesel::sql_query(format!("SET LOCAL lock_timeout = {timeout_ms}"))
                            .execute(conn)?;
                        let mut unit = PgBoardTransaction { connection: conn };
                        work(&mut unit).map_err(UnitError::Work)
                    })
                    .map_err(|err| match err {
                        UnitError::Work(work_err) => work_err,
                        UnitError::Database(db_err) => E::from(map_diesel_error(db_err)),
                    })
            },
        )
        .await
    }

    async fn find_task(&self, task_id: TaskId) -> BoardStoreResult<Option<Task>> {
        self.run_read(move |connection| PgBoardTransaction { connection }.find_task(task_id))
            .await
    }

    async fn load_board(&self, user_id: UserId) -> BoardStoreResult<UserBoard> {
        self.run_read(move |connection| {
            PgBoardTransaction { connection }.load_placements(user_id)
        })
        .await
    }

    async fn board_entries(&self, user_id: UserId) -> BoardStoreResult<Vec<BoardEntry>> {
        self.run_read(move |connection| {
            let rows = user_task_positions::table
                .inner_join(tasks::table)
                .filter(user_task_positions::user_id.eq(user_id.into_inner()))
                .select((PlacementRow::as_select(), TaskRow::as_select()))
                .load::<(PlacementRow, TaskRow)>(connection)
                .map_err(map_diesel_error)?;
            rows.into_iter()
                .map(|(placement_row, task_row)| {
                    Ok(BoardEntry {
                        placement: row_to_placement(&placement_row)?,
                        task: row_to_task(task_row)?,
                    })
                })
                .collect()
        })
        .await
    }

    async fn status_log(&self, task_id: TaskId) -> BoardStoreResult<Vec<StatusLogEntry>> {
        self.run_read(move |connection| {
            let rows = task_status_log::table
                .filter(task_status_log::task_id.eq(task_id.into_inner()))
                .order((task_status_log::recorded_at.asc(), task_status_log::id.asc()))
                .select(StatusLogRow::as_select())
                .load::<StatusLogRow>(connection)
                .map_err(map_diesel_error)?;
            rows.into_iter().map(row_to_status_log).collect()
        })
        .await
    }

    async fn mark_missed_deadlines(&self, now: DateTime<Utc>) -> BoardStoreResult<u64> {
        self.run_read(move |connection| {
            let in_flight = [
                TaskStatus::InProgress.as_str(),
                TaskStatus::InChanges.as_str(),
            ];
            let flagged = diesel::update(
                tasks::table
                    .filter(tasks::status.eq_any(in_flight))
                    .filter(tasks::missed_deadline.eq(false))
                    .filter(tasks::deadline.lt(now)),
            )
            .set((tasks::missed_deadline.eq(true), tasks::updated_at.eq(now)))
            .execute(connection)
            .map_err(map_diesel_error)?;
            Ok(u64::try_from(flagged).unwrap_or(u64::MAX))
        })
        .await
    }
}

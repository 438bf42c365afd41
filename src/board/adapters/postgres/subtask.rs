//! `PostgreSQL` subtask repository.

use super::{
    blocking::{BlockingError, BoardPgPool, run_blocking},
    models::{SubtaskRow, row_to_subtask, subtask_to_row},
    schema::subtasks,
};
use crate::board::{
    domain::{Subtask, SubtaskId, TaskId},
    ports::{BoardStoreError, BoardStoreResult, SubtaskRepository},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed subtask repository.
#[derive(Debug, Clone)]
pub struct PostgresSubtaskRepository {
    pool: BoardPgPool,
}

impl PostgresSubtaskRepository {
    /// Creates a repository from a connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    async fn run<F, T>(&self, work: F) -> BoardStoreResult<T>
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

#[async_trait]
impl SubtaskRepository for PostgresSubtaskRepository {
    async fn store(&self, subtask: &Subtask) -> BoardStoreResult<()> {
        let subtask_id = subtask.id();
        let row = subtask_to_row(subtask);
        self.run(move |connection| {
            diesel::insert_into(subtasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardStoreError::DuplicateSubtask(subtask_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        BoardStoreError::TaskNotFound(TaskId::from_uuid(row.task_id))
                    }
                    other => BoardStoreError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, subtask: &Subtask) -> BoardStoreResult<()> {
        let subtask_id = subtask.id();
        let row = subtask_to_row(subtask);
        self.run(move |connection| {
            let updated = diesel::update(subtasks::table.find(row.id))
                .set(&row)
                .execute(connection)
                .map_err(BoardStoreError::persistence)?;
            if updated == 0 {
                return Err(BoardStoreError::SubtaskNotFound(subtask_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: SubtaskId) -> BoardStoreResult<Option<Subtask>> {
        self.run(move |connection| {
            let row = subtasks::table
                .find(id.into_inner())
                .select(SubtaskRow::as_select())
                .first::<SubtaskRow>(connection)
                .optional()
                .map_err(BoardStoreError::persistence)?;
            row.map(row_to_subtask).transpose()
        })
        .await
    }

    async fn find_by_task(&self, task_id: TaskId) -> BoardStoreResult<Vec<Subtask>> {
        self.run(move |connection| {
            let rows = subtasks::table
                .filter(subtasks::task_id.eq(task_id.into_inner()))
                .order((subtasks::created_at.asc(), subtasks::id.asc()))
                .select(SubtaskRow::as_select())
                .load::<SubtaskRow>(connection)
                .map_err(BoardStoreError::persistence)?;
            rows.into_iter().map(row_to_subtask).collect()
        })
        .await
    }
}

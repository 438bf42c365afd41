//! `PostgreSQL` user directory over the `users` and `user_task_limits`
//! tables.

use super::{
    blocking::{BlockingError, BoardPgPool, run_blocking},
    models::{UserRow, profile_to_row, row_to_profile},
    schema::{user_task_limits, users},
};
use crate::board::{
    domain::{UserId, UserProfile, UserRole},
    ports::{DirectoryError, DirectoryResult, UserDirectory},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;

/// `PostgreSQL`-backed user directory.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: BoardPgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory from a connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    /// Inserts a user or refreshes their name and role.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Persistence`] when the write fails.
    pub async fn upsert_user(&self, profile: &UserProfile) -> DirectoryResult<()> {
        let row = profile_to_row(profile);
        run_blocking(&self.pool, blocking_failure, move |connection| {
            diesel::insert_into(users::table)
                .values(&row)
                .on_conflict(users::id)
                .do_update()
                .set((
                    users::display_name.eq(excluded(users::display_name)),
                    users::role.eq(excluded(users::role)),
                ))
                .execute(connection)
                .map_err(DirectoryError::persistence)?;
            Ok(())
        })
        .await
    }

    /// Sets a user's daily task limit override.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Persistence`] when the limit does not fit
    /// the schema or the write fails.
    pub async fn set_task_limit(&self, user_id: UserId, limit: u32) -> DirectoryResult<()> {
        let daily_limit = i32::try_from(limit).map_err(DirectoryError::persistence)?;
        run_blocking(&self.pool, blocking_failure, move |connection| {
            diesel::insert_into(user_task_limits::table)
                .values((
                    user_task_limits::user_id.eq(user_id.into_inner()),
                    user_task_limits::daily_limit.eq(daily_limit),
                ))
                .on_conflict(user_task_limits::user_id)
                .do_update()
                .set(user_task_limits::daily_limit.eq(daily_limit))
                .execute(connection)
                .map_err(DirectoryError::persistence)?;
            Ok(())
        })
        .await
    }
}

fn blocking_failure(err: BlockingError) -> DirectoryError {
    DirectoryError::persistence(err)
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user(&self, user_id: UserId) -> DirectoryResult<Option<UserProfile>> {
        run_blocking(&self.pool, blocking_failure, move |connection| {
            let row = users::table
                .find(user_id.into_inner())
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()
                .map_err(DirectoryError::persistence)?;
            row.map(row_to_profile)
                .transpose()
                .map_err(DirectoryError::persistence)
        })
        .await
    }

    async fn privileged_users(&self, roles: &[UserRole]) -> DirectoryResult<Vec<UserId>> {
        let literals: Vec<String> = roles.iter().map(|role| role.as_str().to_owned()).collect();
        run_blocking(&self.pool, blocking_failure, move |connection| {
            let ids = users::table
                .filter(users::role.eq_any(literals))
                .order(users::id.asc())
                .select(users::id)
                .load::<uuid::Uuid>(connection)
                .map_err(DirectoryError::persistence)?;
            Ok(ids.into_iter().map(UserId::from_uuid).collect())
        })
        .await
    }

    async fn task_limit(&self, user_id: UserId) -> DirectoryResult<Option<u32>> {
        run_blocking(&self.pool, blocking_failure, move |connection| {
            let limit = user_task_limits::table
                .find(user_id.into_inner())
                .select(user_task_limits::daily_limit)
                .first::<i32>(connection)
                .optional()
                .map_err(DirectoryError::persistence)?;
            limit
                .map(u32::try_from)
                .transpose()
                .map_err(DirectoryError::persistence)
        })
        .await
    }
}

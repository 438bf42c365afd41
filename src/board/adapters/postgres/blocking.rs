//! Offloads synchronous Diesel work to the blocking thread pool.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// Failures raised before the caller's closure gets a connection or after
/// it returns.
#[derive(Debug, Error)]
pub(super) enum BlockingError {
    #[error("failed to check out a connection: {0}")]
    Pool(#[from] PoolError),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs `work` with a pooled connection on [`tokio::task::spawn_blocking`].
pub(super) async fn run_blocking<F, T, E>(
    pool: &BoardPgPool,
    map_err: fn(BlockingError) -> E,
    work: F,
) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let owned_pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = owned_pool.get().map_err(|err| map_err(err.into()))?;
        work(&mut connection)
    })
    .await
    .map_err(|err| map_err(err.into()))?
}

//! Shared test helpers for `PostgreSQL` integration tests.

use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{ClusterHandle, TestCluster};
use taskboard::board::{
    adapters::postgres::{
        BoardPgPool, PostgresBoardStore, PostgresSubtaskRepository, PostgresUserDirectory,
    },
    domain::{UserId, UserProfile, UserRole},
    services::TaskBoardService,
};
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Boxed error used by fallible helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// SQL creating the task board schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_task_board/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "taskboard_test_template";

/// Service type wired over the `PostgreSQL` adapters.
pub type PgService = TaskBoardService<PostgresBoardStore, PostgresUserDirectory, DefaultClock>;

/// Creates a multi-threaded runtime so spawned units can contend.
///
/// # Errors
///
/// Returns an error if the runtime cannot be built.
pub fn test_runtime() -> Result<Runtime, BoxError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()?;
    Ok(runtime)
}

/// Ensures the template database exists with the schema applied.
///
/// # Errors
///
/// Returns an error if template creation or migration fails.
pub fn ensure_template(cluster: &TestCluster) -> Result<(), BoxError> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            // The migration carries plpgsql bodies, so it must not be split.
            conn.batch_execute(CREATE_SCHEMA_SQL)
                .map_err(|e| eyre::eyre!("migration failed: {e}"))?;
            Ok(())
        })
        .map_err(|e| Box::new(e) as BoxError)?;
    Ok(())
}

/// Drops a test database when the owning fixture goes out of scope.
pub struct CleanupGuard {
    cluster: &'static ClusterHandle,
    db_name: String,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(self.db_name.as_str()));
    }
}

/// A migrated database with adapters and a service over it.
///
/// The cleanup guard is the last field so every pooled connection is
/// released before the database is dropped.
pub struct PreparedBoard {
    /// Pool over the test database.
    pub pool: BoardPgPool,
    /// Board store adapter.
    pub store: Arc<PostgresBoardStore>,
    /// User directory adapter.
    pub directory: Arc<PostgresUserDirectory>,
    /// Subtask repository adapter.
    pub subtasks: Arc<PostgresSubtaskRepository>,
    /// Service under test.
    pub service: PgService,
    /// Employee assigned the tasks.
    pub assignee: UserId,
    /// Human resources user holding a card for every task.
    pub privileged: UserId,
    _database: CleanupGuard,
}

/// Creates a database from the template and registers two users.
///
/// Call this outside the runtime: database provisioning blocks.
///
/// # Errors
///
/// Returns an error if provisioning fails.
pub fn prepare_board(
    cluster: &'static TestCluster,
    runtime: &Runtime,
) -> Result<PreparedBoard, BoxError> {
    ensure_template(cluster)?;
    let db_name = format!("taskboard_test_{}", Uuid::new_v4().simple());
    cluster
        .create_database_from_template(db_name.as_str(), TEMPLATE_DB)
        .map_err(|e| Box::new(e) as BoxError)?;
    let guard = CleanupGuard {
        cluster,
        db_name: db_name.clone(),
    };

    let url = cluster.connection().database_url(&db_name);
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder().max_size(8).build(manager)?;

    let store = Arc::new(PostgresBoardStore::new(pool.clone()));
    let directory = Arc::new(PostgresUserDirectory::new(pool.clone()));
    let subtasks = Arc::new(PostgresSubtaskRepository::new(pool.clone()));
    let assignee = UserId::new();
    let privileged = UserId::new();
    runtime.block_on(async {
        directory
            .upsert_user(&UserProfile::new(assignee, "Alice", UserRole::Employee))
            .await?;
        directory
            .upsert_user(&UserProfile::new(privileged, "Bob", UserRole::HumanResource))
            .await
    })?;
    let service = TaskBoardService::new(
        Arc::clone(&store),
        Arc::clone(&directory),
        Arc::new(DefaultClock),
    );

    Ok(PreparedBoard {
        pool,
        store,
        directory,
        subtasks,
        service,
        assignee,
        privileged,
        _database: guard,
    })
}

/// A transaction on a separate connection, held open until committed.
///
/// Used to park locks or uncommitted writes while the service runs.
pub struct OpenTransaction {
    release: mpsc::Sender<()>,
    worker: JoinHandle<Result<(), BoxError>>,
}

impl OpenTransaction {
    /// Runs `statements` in a new transaction and returns once they have
    /// executed, leaving the transaction open.
    ///
    /// # Errors
    ///
    /// Returns an error if a statement fails.
    pub fn begin(pool: &BoardPgPool, statements: Vec<String>) -> Result<Self, BoxError> {
        let worker_pool = pool.clone();
        let (ready_tx, ready_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let worker = std::thread::spawn(move || -> Result<(), BoxError> {
            let mut conn = worker_pool.get()?;
            conn.transaction::<_, diesel::result::Error, _>(|tx| {
                for statement in &statements {
                    tx.batch_execute(statement)?;
                }
                drop(ready_tx.send(()));
                drop(release_rx.recv());
                Ok(())
            })?;
            Ok(())
        });
        if ready_rx.recv().is_err() {
            worker
                .join()
                .map_err(|_| BoxError::from("transaction thread panicked"))??;
            return Err("transaction ended before it was ready".into());
        }
        Ok(Self {
            release: release_tx,
            worker,
        })
    }

    /// Commits the transaction and waits for the connection to settle.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub fn commit(self) -> Result<(), BoxError> {
        drop(self.release.send(()));
        self.worker
            .join()
            .map_err(|_| BoxError::from("transaction thread panicked"))?
    }
}

/// Statement taking the advisory lock that guards one user's board.
#[must_use]
pub fn board_lock_statement(user_id: UserId) -> String {
    format!("SELECT pg_advisory_xact_lock(hashtextextended('{user_id}', 0))")
}

/// Row shape for raw placement queries.
#[derive(diesel::QueryableByName, Debug, PartialEq, Eq)]
pub struct PositionRow {
    /// Column literal.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub board_column: String,
    /// Position within the column.
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub position: i32,
}

/// Reads the positions of one user's column straight from the table.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn column_positions(
    board: &PreparedBoard,
    owner: UserId,
    column: &'static str,
) -> Result<Vec<i32>, BoxError> {
    let pool = board.pool.clone();
    let rows = tokio::task::spawn_blocking(move || -> Result<Vec<PositionRow>, BoxError> {
        let mut conn = pool.get()?;
        let rows = diesel::sql_query(
            "SELECT board_column, position FROM user_task_positions \
             WHERE user_id = $1 AND board_column = $2 ORDER BY position",
        )
        .bind::<diesel::sql_types::Uuid, _>(owner.into_inner())
        .bind::<diesel::sql_types::Text, _>(column)
        .load::<PositionRow>(&mut conn)?;
        Ok(rows)
    })
    .await??;
    Ok(rows.into_iter().map(|row| row.position).collect())
}

//! Units that contend for the same task or board.
//!
//! Each test parks a write or lock in a transaction on its own connection,
//! starts the service call behind it and then commits, so the service must
//! observe the committed state rather than what it could read beforehand.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use super::helpers::{
    BoxError, OpenTransaction, board_lock_statement, column_positions, prepare_board,
    test_runtime,
};
use chrono::{Duration, TimeZone, Utc};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use taskboard::board::{
    adapters::postgres::PostgresBoardStore,
    domain::{ProjectId, TaskDomainError, TaskEdit, TaskName, TaskStatus, UserId},
    ports::BoardStoreError,
    services::{CreateTaskRequest, MoveTaskRequest, TaskBoardError, TaskBoardService},
};

/// Time given to the contending unit to reach the parked lock.
const SETTLE: StdDuration = StdDuration::from_millis(300);

fn request(assignee: UserId, name: &str) -> Result<CreateTaskRequest, BoxError> {
    let starts_at = Utc
        .with_ymd_and_hms(2026, 3, 9, 9, 0, 0)
        .single()
        .ok_or("invalid timestamp")?;
    Ok(CreateTaskRequest::new(
        ProjectId::new(),
        assignee,
        name,
        starts_at,
        starts_at + Duration::days(1),
    ))
}

fn complete_statement(task_id: impl std::fmt::Display) -> String {
    format!("UPDATE tasks SET status = 'completed' WHERE id = '{task_id}'")
}

async fn commit_after_settling(held: OpenTransaction) -> Result<(), BoxError> {
    tokio::time::sleep(SETTLE).await;
    tokio::task::spawn_blocking(move || held.commit()).await?
}

#[rstest]
fn moves_check_the_guard_against_committed_status(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let rt = test_runtime()?;
    let board = Arc::new(prepare_board(shared_test_cluster, &rt)?);
    rt.block_on(async {
        let task = board
            .service
            .create_task(request(board.assignee, "Contended")?)
            .await?;
        board
            .service
            .move_task(MoveTaskRequest::new(task.id(), board.assignee, "InReview", 1))
            .await?;

        let held = OpenTransaction::begin(&board.pool, vec![complete_statement(task.id())])?;
        let shared = Arc::clone(&board);
        let task_id = task.id();
        let mover = tokio::spawn(async move {
            shared
                .service
                .move_task(MoveTaskRequest::new(task_id, shared.assignee, "InChanges", 1))
                .await
        });
        commit_after_settling(held).await?;
        let moved = mover.await?;

        assert!(matches!(
            moved,
            Err(TaskBoardError::Domain(TaskDomainError::InvalidTransition {
                from: TaskStatus::Completed,
                to: TaskStatus::InChanges,
                ..
            }))
        ));
        assert_eq!(
            board.service.get_task(task_id).await?.status(),
            TaskStatus::Completed
        );
        assert_eq!(board.service.get_audit_trail(task_id).await?.len(), 1);
        assert_eq!(
            column_positions(&board, board.assignee, "in_review").await?,
            [1]
        );
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn edits_keep_a_concurrently_committed_status(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let rt = test_runtime()?;
    let board = Arc::new(prepare_board(shared_test_cluster, &rt)?);
    rt.block_on(async {
        let task = board
            .service
            .create_task(request(board.assignee, "Before")?)
            .await?;
        board
            .service
            .move_task(MoveTaskRequest::new(task.id(), board.assignee, "InReview", 1))
            .await?;

        let held = OpenTransaction::begin(&board.pool, vec![complete_statement(task.id())])?;
        let shared = Arc::clone(&board);
        let task_id = task.id();
        let edit = TaskEdit {
            name: Some(TaskName::new("After")?),
            ..TaskEdit::default()
        };
        let editor = tokio::spawn(async move { shared.service.edit_task(task_id, edit).await });
        commit_after_settling(held).await?;
        editor.await??;

        let stored = board.service.get_task(task_id).await?;
        assert_eq!(stored.status(), TaskStatus::Completed);
        assert_eq!(stored.name().as_str(), "After");
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn concurrent_creates_respect_the_daily_limit(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let rt = test_runtime()?;
    let board = Arc::new(prepare_board(shared_test_cluster, &rt)?);
    rt.block_on(async {
        board.directory.set_task_limit(board.assignee, 2).await?;
        board
            .service
            .create_task(request(board.assignee, "Existing")?)
            .await?;

        let held =
            OpenTransaction::begin(&board.pool, vec![board_lock_statement(board.assignee)])?;
        let mut creators = Vec::new();
        for name in ["First", "Second"] {
            let shared = Arc::clone(&board);
            let pending = request(board.assignee, name)?;
            creators.push(tokio::spawn(
                async move { shared.service.create_task(pending).await },
            ));
        }
        commit_after_settling(held).await?;

        let mut created = 0;
        let mut refused = 0;
        for creator in creators {
            match creator.await? {
                Ok(_) => created += 1,
                Err(TaskBoardError::LimitExceeded { limit: 2, .. }) => refused += 1,
                Err(other) => return Err(other.into()),
            }
        }
        assert_eq!((created, refused), (1, 1));
        assert_eq!(column_positions(&board, board.assignee, "todo").await?, [1, 2]);
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn concurrent_batches_respect_the_daily_limit(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let rt = test_runtime()?;
    let board = Arc::new(prepare_board(shared_test_cluster, &rt)?);
    rt.block_on(async {
        board.directory.set_task_limit(board.assignee, 3).await?;

        let held =
            OpenTransaction::begin(&board.pool, vec![board_lock_statement(board.assignee)])?;
        let mut batches = Vec::new();
        for prefix in ["A", "B"] {
            let shared = Arc::clone(&board);
            let pending = vec![
                request(board.assignee, &format!("{prefix}1"))?,
                request(board.assignee, &format!("{prefix}2"))?,
            ];
            batches.push(tokio::spawn(
                async move { shared.service.create_tasks(pending).await },
            ));
        }
        commit_after_settling(held).await?;

        let mut created = 0;
        let mut skipped = 0;
        for batch in batches {
            let outcome = batch.await??;
            created += outcome.created.len();
            skipped += outcome.skipped.len();
        }
        assert_eq!((created, skipped), (3, 1));
        assert_eq!(
            column_positions(&board, board.assignee, "todo").await?,
            [1, 2, 3]
        );
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn board_lock_waits_are_bounded_by_the_lock_timeout(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let rt = test_runtime()?;
    let board = prepare_board(shared_test_cluster, &rt)?;
    let impatient = TaskBoardService::new(
        Arc::new(
            PostgresBoardStore::new(board.pool.clone())
                .with_lock_timeout(StdDuration::from_millis(100)),
        ),
        Arc::clone(&board.directory),
        Arc::new(DefaultClock),
    );
    rt.block_on(async {
        let held =
            OpenTransaction::begin(&board.pool, vec![board_lock_statement(board.assignee)])?;
        let blocked = impatient
            .create_task(request(board.assignee, "Blocked")?)
            .await;
        tokio::task::spawn_blocking(move || held.commit()).await??;

        assert!(matches!(
            blocked,
            Err(TaskBoardError::Store(BoardStoreError::ConcurrencyConflict))
        ));
        assert!(blocked.as_ref().is_err_and(TaskBoardError::is_transient));
        assert!(column_positions(&board, board.assignee, "todo").await?.is_empty());

        impatient
            .create_task(request(board.assignee, "Retried")?)
            .await?;
        assert_eq!(column_positions(&board, board.assignee, "todo").await?, [1]);
        Ok::<(), BoxError>(())
    })
}

//! Position ledger behaviour observed through the task board service.

use super::helpers::{
    BoardWorld, assignee, ensure_columns_match_status, ensure_dense, privileged, world,
};
use eyre::ensure;
use rstest::rstest;
use taskboard::board::{
    domain::{TaskDomainError, TaskStatus},
    services::TaskBoardError,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn moving_a_card_renumbers_both_columns(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(4).await;
    let [first, second, third, fourth] = tasks.as_slice() else {
        eyre::bail!("expected four tasks");
    };
    world
        .move_as(assignee(), fourth.id(), TaskStatus::InProgress, 1)
        .await?;
    ensure!(
        world.column(assignee(), TaskStatus::Todo)
            == vec![(first.id(), 1), (second.id(), 2), (third.id(), 3)]
    );

    world
        .move_as(assignee(), second.id(), TaskStatus::InProgress, 1)
        .await?;

    ensure!(world.column(assignee(), TaskStatus::Todo) == vec![(first.id(), 1), (third.id(), 2)]);
    ensure!(
        world.column(assignee(), TaskStatus::InProgress)
            == vec![(second.id(), 1), (fourth.id(), 2)]
    );
    ensure_dense(&world.placements())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn other_stakeholders_append_at_their_own_next_slot(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(3).await;
    let [first, second, third] = tasks.as_slice() else {
        eyre::bail!("expected three tasks");
    };
    world
        .move_as(privileged(), first.id(), TaskStatus::InProgress, 1)
        .await?;
    world
        .move_as(privileged(), second.id(), TaskStatus::InProgress, 2)
        .await?;

    let ledger_move = world
        .move_as(assignee(), third.id(), TaskStatus::InProgress, 1)
        .await?;

    ensure!(ledger_move.others.len() == 1);
    ensure!(
        world.column(assignee(), TaskStatus::InProgress)
            == vec![(third.id(), 1), (first.id(), 2), (second.id(), 3)]
    );
    ensure!(
        world.column(privileged(), TaskStatus::InProgress)
            == vec![(first.id(), 1), (second.id(), 2), (third.id(), 3)],
        "the follower's board keeps its own order and appends the moved card"
    );
    ensure_dense(&world.placements())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reorder_within_a_column_leaves_other_boards_untouched(
    world: BoardWorld,
) -> eyre::Result<()> {
    let tasks = world.create_tasks(3).await;
    let [first, second, third] = tasks.as_slice() else {
        eyre::bail!("expected three tasks");
    };
    let follower_before = world.column(privileged(), TaskStatus::Todo);

    world
        .move_as(assignee(), third.id(), TaskStatus::Todo, 1)
        .await?;

    ensure!(
        world.column(assignee(), TaskStatus::Todo)
            == vec![(third.id(), 1), (first.id(), 2), (second.id(), 3)]
    );
    ensure!(world.column(privileged(), TaskStatus::Todo) == follower_before);
    let trail = world.service.get_audit_trail(third.id()).await?;
    ensure!(trail.len() == 1, "a reorder is still an audited move");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn moving_onto_the_current_slot_changes_nothing(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(2).await;
    let second = tasks.get(1).ok_or_else(|| eyre::eyre!("expected two tasks"))?;
    let before = world.store.snapshot()?;

    let ledger_move = world
        .move_as(assignee(), second.id(), TaskStatus::Todo, 2)
        .await?;

    ensure!(ledger_move.is_noop());
    ensure!(world.store.snapshot()? == before);
    ensure!(world.service.get_audit_trail(second.id()).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_moves_leave_the_store_unchanged(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(2).await;
    let first = tasks.first().ok_or_else(|| eyre::eyre!("expected a task"))?;
    world
        .move_as(assignee(), first.id(), TaskStatus::InReview, 1)
        .await?;
    let before = world.store.snapshot()?;

    let result = world
        .move_as(assignee(), first.id(), TaskStatus::InProgress, 1)
        .await;

    ensure!(matches!(
        result,
        Err(TaskBoardError::Domain(TaskDomainError::InvalidTransition {
            from: TaskStatus::InReview,
            to: TaskStatus::InProgress,
            ..
        }))
    ));
    ensure!(world.store.snapshot()? == before);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn acting_user_without_a_card_is_rejected(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(1).await;
    let task = tasks.first().ok_or_else(|| eyre::eyre!("expected a task"))?;
    let outsider = super::helpers::user(77);
    let before = world.store.snapshot()?;

    let result = world
        .move_as(outsider, task.id(), TaskStatus::InProgress, 1)
        .await;

    ensure!(matches!(
        result,
        Err(TaskBoardError::Domain(TaskDomainError::PlacementNotFound { .. }))
    ));
    ensure!(world.store.snapshot()? == before);
    Ok(())
}

/// Drives a long deterministic sequence of moves from both stakeholders and
/// checks the board invariants after every step.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn positions_stay_dense_across_arbitrary_moves(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(5).await;
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut accepted = 0_u32;

    for _ in 0..200 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let task_index = usize::try_from(seed % 5)?;
        let column_index = usize::try_from((seed >> 8) % 5)?;
        let position = (seed >> 16) % 7 + 1;
        let actor = if (seed >> 24) % 2 == 0 {
            assignee()
        } else {
            privileged()
        };
        let (Some(task), Some(column)) =
            (tasks.get(task_index), TaskStatus::ALL.get(column_index))
        else {
            eyre::bail!("index out of range");
        };

        match world.move_as(actor, task.id(), *column, position).await {
            Ok(_) => accepted += 1,
            Err(TaskBoardError::Domain(TaskDomainError::InvalidTransition { .. })) => {}
            Err(other) => eyre::bail!("unexpected move failure: {other}"),
        }
        ensure_dense(&world.placements())?;
        ensure_columns_match_status(&world)?;
    }
    ensure!(accepted > 0, "the sequence should exercise accepted moves");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_moves_keep_every_board_dense(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(5).await;
    let world = std::sync::Arc::new(world);
    let mut handles = Vec::new();
    for (task, slot) in tasks.iter().zip(1_u64..) {
        let shared = std::sync::Arc::clone(&world);
        let task_id = task.id();
        handles.push(tokio::spawn(async move {
            shared
                .move_as(assignee(), task_id, TaskStatus::InProgress, slot)
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    ensure!(world.column(assignee(), TaskStatus::InProgress).len() == 5);
    ensure!(world.column(privileged(), TaskStatus::InProgress).len() == 5);
    ensure_dense(&world.placements())?;
    ensure_columns_match_status(&world)
}

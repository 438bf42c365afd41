//! Transition guard enforcement through the task board service.

use super::helpers::{BoardWorld, assignee, privileged, world};
use eyre::ensure;
use rstest::rstest;
use taskboard::board::{
    domain::{TaskDomainError, TaskStatus},
    services::TaskBoardError,
};

fn is_invalid_transition<T>(result: &Result<T, TaskBoardError>) -> bool {
    matches!(
        result,
        Err(TaskBoardError::Domain(TaskDomainError::InvalidTransition { .. }))
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_cannot_return_to_todo(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(1).await;
    let task = tasks.first().ok_or_else(|| eyre::eyre!("expected a task"))?;
    world
        .move_as(assignee(), task.id(), TaskStatus::InProgress, 1)
        .await?;

    let result = world
        .move_as(assignee(), task.id(), TaskStatus::Todo, 1)
        .await;

    ensure!(is_invalid_transition(&result));
    ensure!(world.service.get_task(task.id()).await?.status() == TaskStatus::InProgress);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn todo_cards_may_be_reordered_within_todo(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(2).await;
    let second = tasks.get(1).ok_or_else(|| eyre::eyre!("expected two tasks"))?;

    world
        .move_as(assignee(), second.id(), TaskStatus::Todo, 1)
        .await?;

    let trail = world.service.get_audit_trail(second.id()).await?;
    let entry = trail.first().ok_or_else(|| eyre::eyre!("expected an audit entry"))?;
    ensure!(entry.status_before == TaskStatus::Todo);
    ensure!(entry.status_after == TaskStatus::Todo);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_cannot_regress_to_in_progress_but_may_request_changes(
    world: BoardWorld,
) -> eyre::Result<()> {
    let tasks = world.create_tasks(1).await;
    let task = tasks.first().ok_or_else(|| eyre::eyre!("expected a task"))?;
    world
        .move_as(assignee(), task.id(), TaskStatus::InReview, 1)
        .await?;

    let regress = world
        .move_as(privileged(), task.id(), TaskStatus::InProgress, 1)
        .await;
    ensure!(is_invalid_transition(&regress));

    world
        .move_as(privileged(), task.id(), TaskStatus::InChanges, 1)
        .await?;
    world
        .move_as(assignee(), task.id(), TaskStatus::InProgress, 1)
        .await?;
    ensure!(world.service.get_task(task.id()).await?.status() == TaskStatus::InProgress);
    Ok(())
}

#[rstest]
#[case(TaskStatus::Todo)]
#[case(TaskStatus::InProgress)]
#[case(TaskStatus::InReview)]
#[case(TaskStatus::Completed)]
#[tokio::test(flavor = "multi_thread")]
async fn completed_is_terminal(world: BoardWorld, #[case] target: TaskStatus) -> eyre::Result<()> {
    let tasks = world.create_tasks(1).await;
    let task = tasks.first().ok_or_else(|| eyre::eyre!("expected a task"))?;
    world
        .move_as(assignee(), task.id(), TaskStatus::Completed, 1)
        .await?;
    let before = world.store.snapshot()?;

    let result = world.move_as(assignee(), task.id(), target, 1).await;

    ensure!(is_invalid_transition(&result));
    ensure!(world.store.snapshot()? == before);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn todo_may_jump_straight_to_completed(world: BoardWorld) -> eyre::Result<()> {
    let tasks = world.create_tasks(1).await;
    let task = tasks.first().ok_or_else(|| eyre::eyre!("expected a task"))?;

    world
        .move_as(assignee(), task.id(), TaskStatus::Completed, 1)
        .await?;

    ensure!(world.placement(privileged(), task.id()).map(|p| p.column) == Some(TaskStatus::Completed));
    Ok(())
}

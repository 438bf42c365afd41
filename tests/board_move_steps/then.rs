//! Then steps for board move BDD scenarios.

use std::collections::BTreeMap;

use super::world::{BoardMoveWorld, column, run_async};
use rstest_bdd_macros::then;
use taskboard::board::{
    domain::{TaskDomainError, TaskStatus, UserId},
    services::TaskBoardError,
};

#[then("the move succeeds")]
fn move_succeeds(world: &BoardMoveWorld) -> Result<(), eyre::Report> {
    match world.last_move.as_ref() {
        Some(Ok(_)) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("expected the move to succeed, got {err}")),
        None => Err(eyre::eyre!("missing move result")),
    }
}

#[then(r#""{name}" has task {number:usize} at position {position:u32} of "{target}""#)]
fn has_task_at(
    world: &BoardMoveWorld,
    name: String,
    number: usize,
    position: u32,
    target: String,
) -> Result<(), eyre::Report> {
    let owner = world.user(&name)?;
    let expected_column = column(&target)?;
    let placement = world
        .placement(owner, number)?
        .ok_or_else(|| eyre::eyre!("{name} holds no card for task {number}"))?;
    if placement.column != expected_column || placement.position.value() != position {
        return Err(eyre::eyre!(
            "expected {expected_column} #{position}, found {} #{}",
            placement.column,
            placement.position
        ));
    }
    Ok(())
}

#[then(r#""{name}" has {count:usize} cards in "{target}""#)]
fn has_cards_in(
    world: &BoardMoveWorld,
    name: String,
    count: usize,
    target: String,
) -> Result<(), eyre::Report> {
    let owner = world.user(&name)?;
    let expected_column = column(&target)?;
    let found = world
        .placements()?
        .iter()
        .filter(|entry| entry.user_id == owner && entry.column == expected_column)
        .count();
    if found != count {
        return Err(eyre::eyre!("expected {count} cards, found {found}"));
    }
    Ok(())
}

#[then("every board column is dense")]
fn every_column_dense(world: &BoardMoveWorld) -> Result<(), eyre::Report> {
    let mut columns: BTreeMap<(UserId, TaskStatus), Vec<u32>> = BTreeMap::new();
    for entry in world.placements()? {
        columns
            .entry((entry.user_id, entry.column))
            .or_default()
            .push(entry.position.value());
    }
    for ((owner, status), mut positions) in columns {
        positions.sort_unstable();
        let expected: Vec<u32> = (1_u32..).take(positions.len()).collect();
        if positions != expected {
            return Err(eyre::eyre!("{owner} {status} holds {positions:?}"));
        }
    }
    Ok(())
}

#[then("the move fails with an invalid transition error")]
fn move_fails_with_invalid_transition(world: &BoardMoveWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_move
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing move result"))?;
    if !matches!(
        result,
        Err(TaskBoardError::Domain(
            TaskDomainError::InvalidTransition { .. }
        ))
    ) {
        return Err(eyre::eyre!(
            "expected InvalidTransition error, got {result:?}"
        ));
    }
    Ok(())
}

#[then(r#"task {number:usize} has status "{state}""#)]
fn task_has_status(
    world: &BoardMoveWorld,
    number: usize,
    state: String,
) -> Result<(), eyre::Report> {
    let expected = column(&state)?;
    let task_id = world.task(number)?.id();
    let task = run_async(world.service.get_task(task_id))?;
    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            task.status()
        ));
    }
    Ok(())
}

#[then(r#"task {number:usize} has no audit entries"#)]
fn task_has_no_audit_entries(world: &BoardMoveWorld, number: usize) -> Result<(), eyre::Report> {
    let task_id = world.task(number)?.id();
    let trail = run_async(world.service.get_audit_trail(task_id))?;
    if !trail.is_empty() {
        return Err(eyre::eyre!("expected no audit entries, found {}", trail.len()));
    }
    Ok(())
}

#[then("creation fails with a daily limit error")]
fn creation_fails_with_limit(world: &BoardMoveWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_create
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing creation result"))?;
    if !matches!(result, Err(TaskBoardError::LimitExceeded { .. })) {
        return Err(eyre::eyre!("expected LimitExceeded error, got {result:?}"));
    }
    Ok(())
}

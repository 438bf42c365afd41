//! When steps for board move BDD scenarios.

use super::world::{BoardMoveWorld, run_async, task_request};
use rstest_bdd_macros::when;
use taskboard::board::services::MoveTaskRequest;

#[when(r#""{name}" moves task {number:usize} to "{target}" at position {position:u64}"#)]
fn move_task(
    world: &mut BoardMoveWorld,
    name: String,
    number: usize,
    target: String,
    position: u64,
) -> Result<(), eyre::Report> {
    let actor = world.user(&name)?;
    let task_id = world.task(number)?.id();
    let result = run_async(
        world
            .service
            .move_task(MoveTaskRequest::new(task_id, actor, target, position)),
    );
    world.last_move = Some(result);
    Ok(())
}

#[when(r#"a task starting on that day is created for "{name}""#)]
fn create_same_day_task(world: &mut BoardMoveWorld, name: String) -> Result<(), eyre::Report> {
    let assignee = world.user(&name)?;
    let result = run_async(
        world
            .service
            .create_task(task_request(assignee, "One too many", 0)),
    );
    world.last_create = Some(result);
    Ok(())
}

//! User directory lookups over `PostgreSQL`.

use super::helpers::{BoxError, prepare_board, test_runtime};
use pg_embedded_setup_unpriv::{TestCluster, test_support::shared_test_cluster};
use rstest::rstest;
use taskboard::board::{
    domain::{UserId, UserProfile, UserRole},
    ports::UserDirectory,
};

#[rstest]
fn privileged_users_are_selected_by_role(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let rt = test_runtime()?;
    let board = prepare_board(shared_test_cluster, &rt)?;
    rt.block_on(async {
        let founder = UserId::new();
        board
            .directory
            .upsert_user(&UserProfile::new(founder, "Fay", UserRole::Founder))
            .await?;

        let mut expected = vec![board.privileged, founder];
        expected.sort();
        let found = board
            .directory
            .privileged_users(&UserRole::DEFAULT_PRIVILEGED)
            .await?;
        assert_eq!(found, expected);

        let founders = board
            .directory
            .privileged_users(&[UserRole::Founder])
            .await?;
        assert_eq!(founders, vec![founder]);
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn profiles_and_limits_round_trip(
    shared_test_cluster: &'static TestCluster,
) -> Result<(), BoxError> {
    let rt = test_runtime()?;
    let board = prepare_board(shared_test_cluster, &rt)?;
    rt.block_on(async {

        let profile = board.directory.find_user(board.assignee).await?;
        assert_eq!(
            profile,
            Some(UserProfile::new(board.assignee, "Alice", UserRole::Employee))
        );
        assert_eq!(board.directory.task_limit(board.assignee).await?, None);

        board.directory.set_task_limit(board.assignee, 3).await?;
        board.directory.set_task_limit(board.assignee, 4).await?;
        assert_eq!(board.directory.task_limit(board.assignee).await?, Some(4));
        assert_eq!(board.directory.find_user(UserId::new()).await?, None);
        Ok::<(), BoxError>(())
    })
}

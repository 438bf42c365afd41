//! In-memory user directory.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::{UserId, UserProfile, UserRole},
    ports::{DirectoryError, DirectoryResult, UserDirectory},
};

/// Thread-safe in-memory user directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: BTreeMap<UserId, UserProfile>,
    task_limits: HashMap<UserId, u32>,
}

fn lock_error(err: impl ToString) -> DirectoryError {
    DirectoryError::persistence(std::io::Error::other(err.to_string()))
}

impl InMemoryUserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Persistence`] when the lock is poisoned.
    pub fn add_user(&self, profile: UserProfile) -> DirectoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.users.insert(profile.id, profile);
        Ok(())
    }

    /// Sets a per-user daily task limit override.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Persistence`] when the lock is poisoned.
    pub fn set_task_limit(&self, user_id: UserId, limit: u32) -> DirectoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.task_limits.insert(user_id, limit);
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, user_id: UserId) -> DirectoryResult<Option<UserProfile>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn privileged_users(&self, roles: &[UserRole]) -> DirectoryResult<Vec<UserId>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .users
            .values()
            .filter(|profile| roles.contains(&profile.role))
            .map(|profile| profile.id)
            .collect())
    }

    async fn task_limit(&self, user_id: UserId) -> DirectoryResult<Option<u32>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.task_limits.get(&user_id).copied())
    }
}

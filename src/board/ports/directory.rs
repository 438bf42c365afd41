//! Port for the external user directory.

use crate::board::domain::{UserId, UserProfile, UserRole};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for user directory lookups.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Read-only view of the users known to the HR backend.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a user's profile.
    async fn find_user(&self, user_id: UserId) -> DirectoryResult<Option<UserProfile>>;

    /// Returns every user holding one of `roles`, ascending by identifier.
    async fn privileged_users(&self, roles: &[UserRole]) -> DirectoryResult<Vec<UserId>>;

    /// Returns the per-user daily task limit override, if one is set.
    async fn task_limit(&self, user_id: UserId) -> DirectoryResult<Option<u32>>;
}

/// Errors returned by user directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// Directory backend failure.
    #[error("user directory error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a backend error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

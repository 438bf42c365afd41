//! Stakeholder resolution for task visibility fanout.

use super::{UserId, UserRole};
use std::collections::BTreeSet;

/// Users entitled to a placement for one task.
///
/// The set is the assignee plus every user holding a privileged role,
/// deduplicated and ordered by user identifier. Board locks are taken in
/// this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stakeholders {
    assignee: UserId,
    members: BTreeSet<UserId>,
}

impl Stakeholders {
    /// Resolves the stakeholder set of a task assigned to `assignee`.
    #[must_use]
    pub fn resolve(assignee: UserId, privileged: impl IntoIterator<Item = UserId>) -> Self {
        let mut members: BTreeSet<UserId> = privileged.into_iter().collect();
        members.insert(assignee);
        Self { assignee, members }
    }

    /// Returns the assignee.
    #[must_use]
    pub const fn assignee(&self) -> UserId {
        self.assignee
    }

    /// Returns the stakeholders in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.members.iter().copied()
    }

    /// Returns the number of stakeholders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false`: the assignee is a stakeholder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` when `user_id` is a stakeholder.
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.members.contains(&user_id)
    }
}

/// The roles whose holders see every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegedRoles(BTreeSet<UserRole>);

impl PrivilegedRoles {
    /// Creates a privileged role set.
    #[must_use]
    pub fn new(roles: impl IntoIterator<Item = UserRole>) -> Self {
        Self(roles.into_iter().collect())
    }

    /// Returns `true` when `role` is privileged.
    #[must_use]
    pub fn contains(&self, role: UserRole) -> bool {
        self.0.contains(&role)
    }

    /// Returns the roles in a stable order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<UserRole> {
        self.0.iter().copied().collect()
    }
}

impl Default for PrivilegedRoles {
    fn default() -> Self {
        Self::new(UserRole::DEFAULT_PRIVILEGED)
    }
}

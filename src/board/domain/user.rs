//! Directory-facing user types consumed by stakeholder fanout and auditing.

use super::{ParseUserRoleError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Organisational role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Company founder.
    Founder,
    /// Administrator.
    Admin,
    /// Administrator with elevated rights.
    SuperAdmin,
    /// Human resources staff.
    HumanResource,
    /// Head of a department.
    DepartmentHead,
    /// Task manager.
    TaskManager,
    /// Regular employee.
    Employee,
}

impl UserRole {
    /// Roles that see every task on their personal board by default.
    pub const DEFAULT_PRIVILEGED: [Self; 6] = [
        Self::Founder,
        Self::Admin,
        Self::SuperAdmin,
        Self::HumanResource,
        Self::DepartmentHead,
        Self::TaskManager,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Founder => "founder",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
            Self::HumanResource => "human_resource",
            Self::DepartmentHead => "department_head",
            Self::TaskManager => "task_manager",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UserRole {
    type Error = ParseUserRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "founder" => Ok(Self::Founder),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::SuperAdmin),
            "humanresource" => Ok(Self::HumanResource),
            "departmenthead" => Ok(Self::DepartmentHead),
            "taskmanager" => Ok(Self::TaskManager),
            "employee" => Ok(Self::Employee),
            _ => Err(ParseUserRoleError(value.to_owned())),
        }
    }
}

/// Snapshot of a directory user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: UserId,
    /// Name shown on boards and in the audit trail.
    pub display_name: String,
    /// Organisational role.
    pub role: UserRole,
}

impl UserProfile {
    /// Creates a user profile.
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            role,
        }
    }
}

//! User tags and project roles.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Project-level role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages skills, dependencies, roles and workload.
    Admin,
    /// Decides self-report requests only.
    Approver,
}

impl Role {
    /// Check if the role may decide self-report requests.
    pub fn can_approve(&self) -> bool {
        matches!(self, Self::Admin | Self::Approver)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::Approver,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Approver => write!(f, "approver"),
        }
    }
}

/// A user's role in a project.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRole {
    pub project_id: String,
    pub user_id: String,
    /// Role: `admin` or `approver`.
    pub role: String,
}

impl ProjectRole {
    /// Parse the role string into an enum.
    pub fn role_enum(&self) -> Role {
        Role::from(self.role.as_str())
    }
}

/// A `(key, value)` attribute carried by a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserTag {
    pub user_id: String,
    pub tag_key: String,
    pub tag_value: String,
}

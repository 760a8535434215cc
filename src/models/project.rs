//! Project model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A project owns skills, dependencies, roles, workload rules and requests.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project identifier.
    pub project_id: String,

    /// Display name.
    pub name: String,

    /// Creation timestamp (Unix millis).
    pub created_at: i64,
}

/// Data required to create a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub project_id: String,
    pub name: String,
}

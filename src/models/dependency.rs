//! Skill dependency models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// `from_skill_id` requires `to_skill_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    pub project_id: String,
    pub from_skill_id: String,
    pub to_skill_id: String,
    pub created_at: i64,
}

/// One prerequisite of a skill, as seen by a particular user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    /// Skill that declares the dependency.
    pub skill_id: String,
    /// Prerequisite skill.
    pub depends_on_skill_id: String,
    /// Prerequisite display name.
    pub depends_on_name: String,
    /// Whether `skill_id` is the skill the info was requested for.
    pub is_direct: bool,
    /// Whether the user has completed the prerequisite.
    pub achieved: bool,
}

/// All prerequisites of a skill for a user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillDependencyInfo {
    pub project_id: String,
    pub skill_id: String,
    pub user_id: String,
    pub dependencies: Vec<DependencyInfo>,
}

impl SkillDependencyInfo {
    /// Check whether every prerequisite is achieved.
    pub fn all_achieved(&self) -> bool {
        self.dependencies.iter().all(|d| d.achieved)
    }
}

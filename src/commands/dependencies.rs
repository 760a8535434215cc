//! Skill dependency commands.

use crate::error::AppError;
use crate::models::{DependencyEdge, SkillDependencyInfo};
use crate::services::dependencies;
use crate::state::AppState;
use serde::Deserialize;

/// Input for add_dependency and remove_dependency.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInput {
    pub project_id: String,
    /// Skill that gains the prerequisite.
    pub skill_id: String,
    /// Prerequisite skill.
    pub dependent_skill_id: String,
}

/// Input for get_dependency_info.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfoInput {
    pub project_id: String,
    pub skill_id: String,
    pub user_id: String,
}

/// Make `skillId` require `dependentSkillId`.
///
/// Fails with `CircularDependency` when the prerequisite already depends
/// on the skill, directly or transitively.
pub async fn add_dependency(state: &AppState, input: DependencyInput) -> Result<(), AppError> {
    dependencies::add_dependency(
        &state.pool,
        &state.graph_locks,
        &input.project_id,
        &input.skill_id,
        &input.dependent_skill_id,
    )
    .await
}

/// Remove a prerequisite. Removing one that does not exist is not an error.
pub async fn remove_dependency(state: &AppState, input: DependencyInput) -> Result<(), AppError> {
    dependencies::remove_dependency(
        &state.pool,
        &input.project_id,
        &input.skill_id,
        &input.dependent_skill_id,
    )
    .await?;
    Ok(())
}

pub async fn list_dependencies(
    state: &AppState,
    project_id: String,
) -> Result<Vec<DependencyEdge>, AppError> {
    dependencies::list_dependencies(&state.pool, &project_id).await
}

pub async fn list_skill_dependencies(
    state: &AppState,
    project_id: String,
    skill_id: String,
) -> Result<Vec<DependencyEdge>, AppError> {
    dependencies::list_skill_dependencies(&state.pool, &project_id, &skill_id).await
}

pub async fn get_dependency_info(
    state: &AppState,
    input: DependencyInfoInput,
) -> Result<SkillDependencyInfo, AppError> {
    dependencies::load_skill_dependency_info(
        &state.pool,
        &input.project_id,
        &input.user_id,
        &input.skill_id,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_input_deserialize() {
        let json = r#"{"projectId": "proj1", "skillId": "skill2", "dependentSkillId": "skill1"}"#;
        let input: DependencyInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.skill_id, "skill2");
        assert_eq!(input.dependent_skill_id, "skill1");
    }
}

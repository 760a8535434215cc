//! Skill commands.

use crate::error::AppError;
use crate::models::{Skill, SkillRequest};
use crate::services::{points, skills};
use crate::state::AppState;
use serde::{Deserialize, Serialize};

/// Input for create_skill and update_skill.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillInput {
    pub project_id: String,
    #[serde(flatten)]
    pub skill: SkillRequest,
}

/// Identifies one skill.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRef {
    pub project_id: String,
    pub skill_id: String,
}

/// Input for get_user_points.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPointsInput {
    pub project_id: String,
    pub skill_id: String,
    pub user_id: String,
}

/// Response for get_user_points.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPointsResponse {
    pub points: i64,
    pub achieved: bool,
}

pub async fn create_skill(state: &AppState, input: SkillInput) -> Result<Skill, AppError> {
    let skill = skills::create_skill(&state.pool, &state.config, &input.project_id, input.skill).await?;
    log::info!("Created skill {}:{}", skill.project_id, skill.skill_id);
    Ok(skill)
}

/// Edit name, points, repetitions or self reporting mode of a skill.
pub async fn update_skill(state: &AppState, input: SkillInput) -> Result<Skill, AppError> {
    let skill_id = input.skill.skill_id.clone();
    skills::update_skill(
        &state.pool,
        &state.config,
        &input.project_id,
        &skill_id,
        input.skill,
    )
    .await
}

pub async fn get_skill(state: &AppState, input: SkillRef) -> Result<Skill, AppError> {
    skills::get_skill(&state.pool, &input.project_id, &input.skill_id).await
}

pub async fn list_skills(state: &AppState, project_id: String) -> Result<Vec<Skill>, AppError> {
    skills::list_skills(&state.pool, &project_id).await
}

/// Delete a skill. Its edges, requests and points go with it.
pub async fn delete_skill(state: &AppState, input: SkillRef) -> Result<(), AppError> {
    skills::delete_skill(&state.pool, &input.project_id, &input.skill_id).await
}

pub async fn get_user_points(
    state: &AppState,
    input: UserPointsInput,
) -> Result<UserPointsResponse, AppError> {
    skills::get_skill(&state.pool, &input.project_id, &input.skill_id).await?;
    let points =
        points::get_user_points(&state.pool, &input.project_id, &input.skill_id, &input.user_id)
            .await?;
    let achieved =
        points::is_skill_achieved(&state.pool, &input.project_id, &input.skill_id, &input.user_id)
            .await?;

    Ok(UserPointsResponse { points, achieved })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SelfReportingType;

    #[test]
    fn test_skill_input_deserialize() {
        let json = r#"{
            "projectId": "proj1",
            "skillId": "skill1",
            "name": "First Skill",
            "pointIncrement": 10,
            "numPerformToCompletion": 3,
            "selfReportingType": "honor_system"
        }"#;
        let input: SkillInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.project_id, "proj1");
        assert_eq!(input.skill.point_increment, 10);
        assert_eq!(input.skill.self_reporting_type, SelfReportingType::HonorSystem);
    }
}

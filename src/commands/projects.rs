//! Project, role and user tag commands.

use crate::error::AppError;
use crate::models::{NewProject, Project, ProjectRole, Role, UserTag};
use crate::services::{projects, users};
use crate::state::AppState;
use serde::Deserialize;

/// Input for role commands.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleInput {
    pub project_id: String,
    pub user_id: String,
    pub role: Role,
}

/// Create a project.
pub async fn create_project(state: &AppState, input: NewProject) -> Result<Project, AppError> {
    let project = projects::create_project(&state.pool, input).await?;
    log::info!("Created project {}", project.project_id);
    Ok(project)
}

pub async fn get_project(state: &AppState, project_id: String) -> Result<Project, AppError> {
    projects::get_project(&state.pool, &project_id).await
}

pub async fn list_projects(state: &AppState) -> Result<Vec<Project>, AppError> {
    projects::list_projects(&state.pool).await
}

/// Delete a project with its skills, dependencies, requests and rules.
pub async fn delete_project(state: &AppState, project_id: String) -> Result<(), AppError> {
    projects::delete_project(&state.pool, &project_id).await?;
    state.graph_locks.forget(&project_id);
    Ok(())
}

pub async fn assign_role(state: &AppState, input: RoleInput) -> Result<(), AppError> {
    users::assign_role(&state.pool, &input.project_id, &input.user_id, input.role).await
}

pub async fn remove_role(state: &AppState, input: RoleInput) -> Result<(), AppError> {
    users::remove_role(&state.pool, &input.project_id, &input.user_id, input.role).await
}

pub async fn list_roles(state: &AppState, project_id: String) -> Result<Vec<ProjectRole>, AppError> {
    users::list_roles(&state.pool, &project_id).await
}

pub async fn set_user_tag(state: &AppState, tag: UserTag) -> Result<(), AppError> {
    users::set_user_tag(&state.pool, &tag).await
}

pub async fn remove_user_tag(state: &AppState, tag: UserTag) -> Result<(), AppError> {
    users::remove_user_tag(&state.pool, &tag).await
}

pub async fn get_user_tags(state: &AppState, user_id: String) -> Result<Vec<UserTag>, AppError> {
    users::get_user_tags(&state.pool, &user_id).await
}

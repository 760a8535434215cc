//! Project management.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{NewProject, Project};
use crate::services::now_millis;
use crate::services::validation::{validate_id, validate_name};

/// Create a project.
///
/// # Returns
/// The stored project, or a validation error if the id is already taken
pub async fn create_project(pool: &DbPool, input: NewProject) -> Result<Project, AppError> {
    validate_id(&input.project_id, "projectId")?;
    validate_name(&input.name, "name")?;

    let result = sqlx::query(
        "INSERT INTO projects (project_id, name, created_at) VALUES (?, ?, ?) ON CONFLICT(project_id) DO NOTHING",
    )
    .bind(&input.project_id)
    .bind(input.name.trim())
    .bind(now_millis())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::validation_field(
            format!("Project with id [{}] already exists", input.project_id),
            "projectId",
        ));
    }

    get_project(pool, &input.project_id).await
}

/// Get a project by id.
pub async fn get_project(pool: &DbPool, project_id: &str) -> Result<Project, AppError> {
    sqlx::query_as::<_, Project>(
        "SELECT project_id, name, created_at FROM projects WHERE project_id = ?",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found_with_id("Project", project_id))
}

/// List all projects ordered by id.
pub async fn list_projects(pool: &DbPool) -> Result<Vec<Project>, AppError> {
    let projects = sqlx::query_as::<_, Project>(
        "SELECT project_id, name, created_at FROM projects ORDER BY project_id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

/// Fail with `NotFound` unless the project exists.
pub async fn ensure_exists(pool: &DbPool, project_id: &str) -> Result<(), AppError> {
    let exists = sqlx::query("SELECT 1 FROM projects WHERE project_id = ?")
        .bind(project_id)
        .fetch_optional(pool)
        .await?
        .is_some();

    if !exists {
        return Err(AppError::not_found_with_id("Project", project_id));
    }
    Ok(())
}

/// Delete a project and, through cascading foreign keys, everything it owns.
pub async fn delete_project(pool: &DbPool, project_id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM projects WHERE project_id = ?")
        .bind(project_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found_with_id("Project", project_id));
    }

    log::info!("Deleted project {}", project_id);
    Ok(())
}

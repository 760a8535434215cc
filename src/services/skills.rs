//! Skill management.

use crate::config::EngineConfig;
use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{Skill, SkillRequest};
use crate::services::now_millis;
use crate::services::projects;
use crate::services::validation::{validate_id, validate_name, validate_range};

const SKILL_COLUMNS: &str = "project_id, skill_id, name, point_increment, num_perform_to_completion, self_reporting_type, created_at, updated_at";

/// Validate every field of a skill request.
pub fn validate_skill(input: &SkillRequest, config: &EngineConfig) -> Result<(), AppError> {
    validate_id(&input.skill_id, "skillId")?;
    validate_name(&input.name, "name")?;
    validate_range(
        input.point_increment,
        1,
        config.max_point_increment,
        "pointIncrement",
    )?;
    validate_range(
        input.num_perform_to_completion,
        1,
        config.max_num_perform_to_completion,
        "numPerformToCompletion",
    )?;
    Ok(())
}

/// Create a skill in a project.
pub async fn create_skill(
    pool: &DbPool,
    config: &EngineConfig,
    project_id: &str,
    input: SkillRequest,
) -> Result<Skill, AppError> {
    validate_skill(&input, config)?;
    projects::ensure_exists(pool, project_id).await?;

    let now = now_millis();
    let result = sqlx::query(
        r#"
        INSERT INTO skills (project_id, skill_id, name, point_increment, num_perform_to_completion, self_reporting_type, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(project_id, skill_id) DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(&input.skill_id)
    .bind(input.name.trim())
    .bind(input.point_increment)
    .bind(input.num_perform_to_completion)
    .bind(input.self_reporting_type.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::validation_field(
            format!("Skill with id [{}] already exists", input.skill_id),
            "skillId",
        ));
    }

    log::debug!("Created skill {}:{}", project_id, input.skill_id);
    get_skill(pool, project_id, &input.skill_id).await
}

/// Edit a skill. The identifier itself cannot change.
pub async fn update_skill(
    pool: &DbPool,
    config: &EngineConfig,
    project_id: &str,
    skill_id: &str,
    input: SkillRequest,
) -> Result<Skill, AppError> {
    validate_skill(&input, config)?;
    if input.skill_id != skill_id {
        return Err(AppError::validation_field(
            "Skill id cannot be changed",
            "skillId",
        ));
    }

    let result = sqlx::query(
        r#"
        UPDATE skills
        SET name = ?, point_increment = ?, num_perform_to_completion = ?, self_reporting_type = ?, updated_at = ?
        WHERE project_id = ? AND skill_id = ?
        "#,
    )
    .bind(input.name.trim())
    .bind(input.point_increment)
    .bind(input.num_perform_to_completion)
    .bind(input.self_reporting_type.to_string())
    .bind(now_millis())
    .bind(project_id)
    .bind(skill_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found_with_id(
            "Skill",
            format!("{}:{}", project_id, skill_id),
        ));
    }

    get_skill(pool, project_id, skill_id).await
}

/// Look up a skill, returning `None` when absent.
pub async fn find_skill(
    pool: &DbPool,
    project_id: &str,
    skill_id: &str,
) -> Result<Option<Skill>, AppError> {
    let skill = sqlx::query_as::<_, Skill>(&format!(
        "SELECT {} FROM skills WHERE project_id = ? AND skill_id = ?",
        SKILL_COLUMNS
    ))
    .bind(project_id)
    .bind(skill_id)
    .fetch_optional(pool)
    .await?;

    Ok(skill)
}

/// Get a skill or fail with `NotFound`.
pub async fn get_skill(pool: &DbPool, project_id: &str, skill_id: &str) -> Result<Skill, AppError> {
    find_skill(pool, project_id, skill_id).await?.ok_or_else(|| {
        AppError::not_found_with_id("Skill", format!("{}:{}", project_id, skill_id))
    })
}

/// List the skills of a project ordered by id.
pub async fn list_skills(pool: &DbPool, project_id: &str) -> Result<Vec<Skill>, AppError> {
    projects::ensure_exists(pool, project_id).await?;

    let skills = sqlx::query_as::<_, Skill>(&format!(
        "SELECT {} FROM skills WHERE project_id = ? ORDER BY skill_id ASC",
        SKILL_COLUMNS
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(skills)
}

/// Delete a skill together with its edges, requests, points and the
/// workload rules naming it.
pub async fn delete_skill(pool: &DbPool, project_id: &str, skill_id: &str) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    // skill rules carry no foreign key
    let rules = sqlx::query("DELETE FROM approver_workload_rules WHERE project_id = ? AND skill_id = ?")
        .bind(project_id)
        .bind(skill_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM skills WHERE project_id = ? AND skill_id = ?")
        .bind(project_id)
        .bind(skill_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found_with_id(
            "Skill",
            format!("{}:{}", project_id, skill_id),
        ));
    }

    tx.commit().await?;

    log::info!(
        "Deleted skill {}:{} ({} workload rules)",
        project_id,
        skill_id,
        rules.rows_affected()
    );
    Ok(())
}

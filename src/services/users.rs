//! Project roles and user tags.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{ProjectRole, Role, UserTag};
use crate::services::projects;
use crate::services::validation::{validate_tag_part, validate_user_id};

/// Grant a role in a project. Granting an existing role is a no-op.
pub async fn assign_role(
    pool: &DbPool,
    project_id: &str,
    user_id: &str,
    role: Role,
) -> Result<(), AppError> {
    validate_user_id(user_id, "userId")?;
    projects::ensure_exists(pool, project_id).await?;

    sqlx::query(
        "INSERT INTO project_roles (project_id, user_id, role) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(project_id)
    .bind(user_id)
    .bind(role.to_string())
    .execute(pool)
    .await?;

    log::info!("Granted {} on {} to {}", role, project_id, user_id);
    Ok(())
}

/// Revoke a role. Revoking a role the user does not hold is a no-op.
pub async fn remove_role(
    pool: &DbPool,
    project_id: &str,
    user_id: &str,
    role: Role,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM project_roles WHERE project_id = ? AND user_id = ? AND role = ?")
        .bind(project_id)
        .bind(user_id)
        .bind(role.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// All role assignments of a project.
pub async fn list_roles(pool: &DbPool, project_id: &str) -> Result<Vec<ProjectRole>, AppError> {
    let roles = sqlx::query_as::<_, ProjectRole>(
        "SELECT project_id, user_id, role FROM project_roles WHERE project_id = ? ORDER BY user_id, role",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(roles)
}

/// Roles a user holds in a project.
pub async fn get_user_roles(
    pool: &DbPool,
    project_id: &str,
    user_id: &str,
) -> Result<Vec<Role>, AppError> {
    let roles: Vec<(String,)> =
        sqlx::query_as("SELECT role FROM project_roles WHERE project_id = ? AND user_id = ?")
            .bind(project_id)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

    Ok(roles.iter().map(|(role,)| Role::from(role.as_str())).collect())
}

/// Check whether a user may decide self-report requests in a project.
pub async fn can_approve(pool: &DbPool, project_id: &str, user_id: &str) -> Result<bool, AppError> {
    let roles = get_user_roles(pool, project_id, user_id).await?;
    Ok(roles.iter().any(Role::can_approve))
}

/// Attach a tag to a user. Attaching an existing tag is a no-op.
pub async fn set_user_tag(pool: &DbPool, tag: &UserTag) -> Result<(), AppError> {
    validate_user_id(&tag.user_id, "userId")?;
    validate_tag_part(&tag.tag_key, "tagKey")?;
    validate_tag_part(&tag.tag_value, "tagValue")?;

    sqlx::query(
        "INSERT INTO user_tags (user_id, tag_key, tag_value) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(&tag.user_id)
    .bind(&tag.tag_key)
    .bind(&tag.tag_value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Detach a tag from a user. Missing tags are ignored.
pub async fn remove_user_tag(pool: &DbPool, tag: &UserTag) -> Result<(), AppError> {
    sqlx::query("DELETE FROM user_tags WHERE user_id = ? AND tag_key = ? AND tag_value = ?")
        .bind(&tag.user_id)
        .bind(&tag.tag_key)
        .bind(&tag.tag_value)
        .execute(pool)
        .await?;

    Ok(())
}

/// Tags carried by a user.
pub async fn get_user_tags(pool: &DbPool, user_id: &str) -> Result<Vec<UserTag>, AppError> {
    let tags = sqlx::query_as::<_, UserTag>(
        "SELECT user_id, tag_key, tag_value FROM user_tags WHERE user_id = ? ORDER BY tag_key, tag_value",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

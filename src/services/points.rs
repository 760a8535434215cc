//! User points earned on skills.

use crate::db::pool::DbPool;
use crate::error::AppError;
use serde::Serialize;
use sqlx::{FromRow, SqliteConnection};
use std::collections::HashMap;

/// A user's standing on one skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SkillProgress {
    pub skill_id: String,
    pub points: i64,
    pub total_points: i64,
}

impl SkillProgress {
    /// Check if the user has earned all points of the skill.
    pub fn is_achieved(&self) -> bool {
        self.points >= self.total_points
    }
}

/// Record points for a user on a skill.
///
/// Takes a connection so approvals can award points inside the same
/// transaction that transitions the request.
pub async fn record_points(
    conn: &mut SqliteConnection,
    project_id: &str,
    skill_id: &str,
    user_id: &str,
    performed_on: i64,
    points: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO user_performed_skills (project_id, skill_id, user_id, performed_on, points)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(project_id)
    .bind(skill_id)
    .bind(user_id)
    .bind(performed_on)
    .bind(points)
    .execute(&mut *conn)
    .await?;

    log::debug!(
        "Awarded {} points to {} on {}:{}",
        points,
        user_id,
        project_id,
        skill_id
    );
    Ok(())
}

/// Total points a user earned on a skill.
pub async fn get_user_points(
    pool: &DbPool,
    project_id: &str,
    skill_id: &str,
    user_id: &str,
) -> Result<i64, AppError> {
    let points: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(points), 0)
        FROM user_performed_skills
        WHERE project_id = ? AND skill_id = ? AND user_id = ?
        "#,
    )
    .bind(project_id)
    .bind(skill_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(points)
}

/// Progress of a user on every skill of a project, keyed by skill id.
pub async fn user_progress(
    pool: &DbPool,
    project_id: &str,
    user_id: &str,
) -> Result<HashMap<String, SkillProgress>, AppError> {
    let rows = sqlx::query_as::<_, SkillProgress>(
        r#"
        SELECT s.skill_id AS skill_id,
               COALESCE(SUM(p.points), 0) AS points,
               s.point_increment * s.num_perform_to_completion AS total_points
        FROM skills s
        LEFT JOIN user_performed_skills p
            ON p.project_id = s.project_id AND p.skill_id = s.skill_id AND p.user_id = ?
        WHERE s.project_id = ?
        GROUP BY s.skill_id, s.point_increment, s.num_perform_to_completion
        "#,
    )
    .bind(user_id)
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|progress| (progress.skill_id.clone(), progress))
        .collect())
}

/// Check whether a user completed a skill.
pub async fn is_skill_achieved(
    pool: &DbPool,
    project_id: &str,
    skill_id: &str,
    user_id: &str,
) -> Result<bool, AppError> {
    let progress = user_progress(pool, project_id, user_id).await?;
    Ok(progress
        .get(skill_id)
        .is_some_and(SkillProgress::is_achieved))
}

//! Approver workload configuration and request authorization.
//!
//! A rule assigns an approver the requests of one user, of users carrying a
//! tag, or of one skill. Approvers without rules pick up whatever no rule in
//! the project claims.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{UserTag, WorkloadCriterion, WorkloadRule, WorkloadRuleInput};
use crate::services::validation::{validate_tag_part, validate_user_id};
use crate::services::{now_millis, projects, skills, users};

const RULE_COLUMNS: &str =
    "id, project_id, approver_id, user_id, tag_key, tag_value, skill_id, created_at";

/// Rules configured for one approver.
pub async fn get_workload(
    pool: &DbPool,
    project_id: &str,
    approver_id: &str,
) -> Result<Vec<WorkloadRule>, AppError> {
    projects::ensure_exists(pool, project_id).await?;

    let rules = sqlx::query_as::<_, WorkloadRule>(&format!(
        "SELECT {} FROM approver_workload_rules WHERE project_id = ? AND approver_id = ? ORDER BY id",
        RULE_COLUMNS
    ))
    .bind(project_id)
    .bind(approver_id)
    .fetch_all(pool)
    .await?;

    Ok(rules)
}

/// Every rule of a project.
pub async fn list_project_rules(
    pool: &DbPool,
    project_id: &str,
) -> Result<Vec<WorkloadRule>, AppError> {
    let rules = sqlx::query_as::<_, WorkloadRule>(&format!(
        "SELECT {} FROM approver_workload_rules WHERE project_id = ? ORDER BY id",
        RULE_COLUMNS
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(rules)
}

async fn validate_criterion(
    pool: &DbPool,
    project_id: &str,
    criterion: &WorkloadCriterion,
) -> Result<(), AppError> {
    match criterion {
        WorkloadCriterion::User { user_id } => validate_user_id(user_id, "userId"),
        WorkloadCriterion::Tag { tag_key, tag_value } => {
            validate_tag_part(tag_key, "tagKey")?;
            validate_tag_part(tag_value, "tagValue")
        }
        WorkloadCriterion::Skill { skill_id } => {
            skills::get_skill(pool, project_id, skill_id).await.map(|_| ())
        }
    }
}

async fn get_rule(pool: &DbPool, project_id: &str, rule_id: i64) -> Result<WorkloadRule, AppError> {
    sqlx::query_as::<_, WorkloadRule>(&format!(
        "SELECT {} FROM approver_workload_rules WHERE project_id = ? AND id = ?",
        RULE_COLUMNS
    ))
    .bind(project_id)
    .bind(rule_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found_with_id("WorkloadRule", rule_id.to_string()))
}

/// Create or edit a workload rule.
///
/// With an `id` the rule is rewritten in place (`NotFound` if it does not
/// exist in the project). Without one, an identical existing rule is
/// returned as is, otherwise a new rule is inserted.
pub async fn upsert_workload_rule(
    pool: &DbPool,
    project_id: &str,
    input: WorkloadRuleInput,
) -> Result<WorkloadRule, AppError> {
    validate_user_id(&input.approver_id, "approverId")?;
    projects::ensure_exists(pool, project_id).await?;
    validate_criterion(pool, project_id, &input.criterion).await?;

    let (user_id, tag_key, tag_value, skill_id) = input.criterion.columns();

    if let Some(rule_id) = input.id {
        let result = sqlx::query(
            r#"
            UPDATE approver_workload_rules
            SET approver_id = ?, user_id = ?, tag_key = ?, tag_value = ?, skill_id = ?
            WHERE project_id = ? AND id = ?
            "#,
        )
        .bind(&input.approver_id)
        .bind(user_id)
        .bind(tag_key)
        .bind(tag_value)
        .bind(skill_id)
        .bind(project_id)
        .bind(rule_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found_with_id("WorkloadRule", rule_id.to_string()));
        }
        log::info!("Updated workload rule {} for {}", rule_id, input.approver_id);
        return get_rule(pool, project_id, rule_id).await;
    }

    let existing = sqlx::query_as::<_, WorkloadRule>(&format!(
        r#"
        SELECT {} FROM approver_workload_rules
        WHERE project_id = ? AND approver_id = ?
          AND user_id IS ? AND tag_key IS ? AND tag_value IS ? AND skill_id IS ?
        ORDER BY id
        LIMIT 1
        "#,
        RULE_COLUMNS
    ))
    .bind(project_id)
    .bind(&input.approver_id)
    .bind(user_id)
    .bind(tag_key)
    .bind(tag_value)
    .bind(skill_id)
    .fetch_optional(pool)
    .await?;

    if let Some(rule) = existing {
        return Ok(rule);
    }

    let result = sqlx::query(
        r#"
        INSERT INTO approver_workload_rules
            (project_id, approver_id, user_id, tag_key, tag_value, skill_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(project_id)
    .bind(&input.approver_id)
    .bind(user_id)
    .bind(tag_key)
    .bind(tag_value)
    .bind(skill_id)
    .bind(now_millis())
    .execute(pool)
    .await?;

    let rule_id = result.last_insert_rowid();
    log::info!(
        "Added workload rule {} for {} on {}",
        rule_id,
        input.approver_id,
        project_id
    );
    get_rule(pool, project_id, rule_id).await
}

/// Delete a rule. Deleting an unknown rule is a no-op.
///
/// # Returns
/// Whether a rule was deleted
pub async fn delete_workload_rule(
    pool: &DbPool,
    project_id: &str,
    rule_id: i64,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM approver_workload_rules WHERE project_id = ? AND id = ?")
        .bind(project_id)
        .bind(rule_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Decide whether `approver_id` may act on a request, given all rules of
/// the project. Role checks are separate, see [`ApproverScope`].
pub fn is_authorized(
    approver_id: &str,
    project_rules: &[WorkloadRule],
    user_id: &str,
    user_tags: &[UserTag],
    skill_id: &str,
) -> bool {
    let mut own = project_rules
        .iter()
        .filter(|rule| rule.approver_id == approver_id)
        .peekable();

    if own.peek().is_none() {
        return !project_rules
            .iter()
            .any(|rule| rule.matches(user_id, user_tags, skill_id));
    }
    own.any(|rule| rule.matches(user_id, user_tags, skill_id))
}

/// Snapshot of what one approver may decide in a project.
///
/// Loaded once per batch or listing so each request only costs a tag lookup.
#[derive(Debug, Clone)]
pub struct ApproverScope {
    approver_id: String,
    has_role: bool,
    project_rules: Vec<WorkloadRule>,
}

impl ApproverScope {
    pub async fn load(pool: &DbPool, project_id: &str, approver_id: &str) -> Result<Self, AppError> {
        let has_role = users::can_approve(pool, project_id, approver_id).await?;
        let project_rules = list_project_rules(pool, project_id).await?;

        Ok(Self {
            approver_id: approver_id.to_string(),
            has_role,
            project_rules,
        })
    }

    pub fn has_role(&self) -> bool {
        self.has_role
    }

    /// Check a request from `user_id` (carrying `user_tags`) on `skill_id`.
    pub fn permits(&self, user_id: &str, user_tags: &[UserTag], skill_id: &str) -> bool {
        self.has_role
            && is_authorized(
                &self.approver_id,
                &self.project_rules,
                user_id,
                user_tags,
                skill_id,
            )
    }
}

//! Self-reported skill events and their approval.
//!
//! Approval skills queue a pending request that an approver later approves
//! (awarding the skill's point increment) or rejects. Each decision is a
//! conditional `UPDATE ... WHERE status = 'pending'` issued as the first
//! statement of its transaction, so concurrent approvers racing on one
//! request produce exactly one winner.

use crate::config::EngineConfig;
use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{
    ApprovalFilter, ApprovalOrderBy, ApprovalRequest, BatchResult, Decision, DecisionOutcome,
    Page, PageRequest, SelfReport, SelfReportingType, SubmitResult, UserTag,
};
use crate::services::workload::ApproverScope;
use crate::services::{dependencies, now_millis, points, projects, skills, users};
use crate::services::validation::{validate_message, validate_user_id};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::{HashMap, HashSet};

const REQUEST_COLUMNS: &str = "id, project_id, skill_id, user_id, requested_on, request_msg, status, decided_on, decision_msg, approver_id, hidden_from_user";

/// Report that a user performed a skill.
///
/// # Returns
/// For honor-system skills the awarded points; for approval skills the id
/// of the new pending request
pub async fn submit(
    pool: &DbPool,
    config: &EngineConfig,
    project_id: &str,
    report: SelfReport,
) -> Result<SubmitResult, AppError> {
    validate_user_id(&report.user_id, "userId")?;
    validate_message(report.message.as_deref(), config.max_message_length, "message")?;

    let skill = skills::get_skill(pool, project_id, &report.skill_id).await?;

    match skill.self_reporting_enum() {
        SelfReportingType::Disabled => Err(AppError::self_report_disabled(&report.skill_id)),
        SelfReportingType::HonorSystem => {
            let mut conn = pool.acquire().await?;
            points::record_points(
                &mut conn,
                project_id,
                &report.skill_id,
                &report.user_id,
                report.performed_on,
                skill.point_increment,
            )
            .await?;

            log::info!(
                "Honor system report: {} earned {} points on {}:{}",
                report.user_id,
                skill.point_increment,
                project_id,
                report.skill_id
            );
            Ok(SubmitResult {
                awarded: true,
                points_earned: skill.point_increment,
                request_id: None,
            })
        }
        SelfReportingType::Approval => submit_for_approval(pool, project_id, report).await,
    }
}

async fn submit_for_approval(
    pool: &DbPool,
    project_id: &str,
    report: SelfReport,
) -> Result<SubmitResult, AppError> {
    let required = dependencies::prerequisites(pool, project_id, &report.skill_id).await?;
    if !required.is_empty() {
        let progress = points::user_progress(pool, project_id, &report.user_id).await?;
        let unmet: Vec<String> = required
            .into_iter()
            .filter(|skill_id| !progress.get(skill_id).is_some_and(|p| p.is_achieved()))
            .collect();
        if !unmet.is_empty() {
            log::debug!(
                "Refusing report of {} on {}: unmet {:?}",
                report.user_id,
                report.skill_id,
                unmet
            );
            return Err(AppError::dependency_not_met(&report.skill_id, unmet));
        }
    }

    // Single statement so a concurrent submission cannot slip in a second
    // pending request between the check and the insert.
    let result = sqlx::query(
        r#"
        INSERT INTO approval_requests (project_id, skill_id, user_id, requested_on, request_msg, status)
        SELECT ?, ?, ?, ?, ?, 'pending'
        WHERE NOT EXISTS (
            SELECT 1 FROM approval_requests
            WHERE project_id = ? AND skill_id = ? AND user_id = ? AND status = 'pending'
        )
        "#,
    )
    .bind(project_id)
    .bind(&report.skill_id)
    .bind(&report.user_id)
    .bind(report.performed_on)
    .bind(report.message.as_deref())
    .bind(project_id)
    .bind(&report.skill_id)
    .bind(&report.user_id)
    .execute(pool)
    .await;

    let result = match result {
        Ok(result) => result,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::duplicate_submission(format!(
                "{} already reported {} at {}",
                report.user_id, report.skill_id, report.performed_on
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if result.rows_affected() == 0 {
        return Err(AppError::duplicate_submission(format!(
            "{} already has a pending request for {}",
            report.user_id, report.skill_id
        )));
    }

    let request_id = result.last_insert_rowid();
    log::info!(
        "Queued approval request {} for {} on {}:{}",
        request_id,
        report.user_id,
        project_id,
        report.skill_id
    );
    Ok(SubmitResult {
        awarded: false,
        points_earned: 0,
        request_id: Some(request_id),
    })
}

/// Fetch one request of a project.
pub async fn get_request(
    pool: &DbPool,
    project_id: &str,
    request_id: i64,
) -> Result<ApprovalRequest, AppError> {
    find_request(pool, project_id, request_id)
        .await?
        .ok_or_else(|| AppError::not_found_with_id("ApprovalRequest", request_id.to_string()))
}

async fn find_request(
    pool: &DbPool,
    project_id: &str,
    request_id: i64,
) -> Result<Option<ApprovalRequest>, AppError> {
    let request = sqlx::query_as::<_, ApprovalRequest>(&format!(
        "SELECT {} FROM approval_requests WHERE project_id = ? AND id = ?",
        REQUEST_COLUMNS
    ))
    .bind(project_id)
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Approve requests, awarding each requester the skill's point increment.
pub async fn approve(
    pool: &DbPool,
    project_id: &str,
    request_ids: &[i64],
    approver_id: &str,
) -> Result<BatchResult, AppError> {
    decide(pool, project_id, request_ids, approver_id, Decision::Approve, None).await
}

/// Reject requests. The message is shown to the submitting users.
pub async fn reject(
    pool: &DbPool,
    config: &EngineConfig,
    project_id: &str,
    request_ids: &[i64],
    approver_id: &str,
    message: Option<&str>,
) -> Result<BatchResult, AppError> {
    validate_message(message, config.max_message_length, "rejectionMessage")?;
    decide(pool, project_id, request_ids, approver_id, Decision::Reject, message).await
}

/// Apply a decision to every request id independently.
///
/// Each id gets its own outcome; a failure on one id never undoes an
/// earlier success. Repeated ids are decided once. A database error stops
/// the batch and is returned, as does an approver holding no approving role
/// in the project.
pub async fn decide(
    pool: &DbPool,
    project_id: &str,
    request_ids: &[i64],
    approver_id: &str,
    decision: Decision,
    message: Option<&str>,
) -> Result<BatchResult, AppError> {
    validate_user_id(approver_id, "approverId")?;
    projects::ensure_exists(pool, project_id).await?;

    let scope = ApproverScope::load(pool, project_id, approver_id).await?;
    if !scope.has_role() {
        return Err(AppError::not_authorized(format!(
            "{} is not an approver in {}",
            approver_id, project_id
        )));
    }
    let mut tags = TagCache::default();
    let mut seen = HashSet::new();
    let mut batch = BatchResult::default();

    for &request_id in request_ids {
        if !seen.insert(request_id) {
            continue;
        }

        let Some(request) = find_request(pool, project_id, request_id).await? else {
            batch.push(request_id, DecisionOutcome::NotFound);
            continue;
        };

        let user_tags = tags.get(pool, &request.user_id).await?;
        if !scope.permits(&request.user_id, user_tags, &request.skill_id) {
            log::warn!(
                "{} may not decide request {} ({}:{})",
                approver_id,
                request_id,
                project_id,
                request.skill_id
            );
            batch.push(request_id, DecisionOutcome::NotAuthorized);
            continue;
        }

        if !request.is_pending() {
            batch.push(request_id, DecisionOutcome::AlreadyDecided);
            continue;
        }

        let outcome = apply_decision(pool, &request, approver_id, decision, message).await?;
        batch.push(request_id, outcome);
    }

    log::info!(
        "{} {:?} {}/{} requests in {}",
        approver_id,
        decision,
        batch.decided,
        batch.outcomes.len(),
        project_id
    );
    Ok(batch)
}

/// Transition one pending request and, on approval, award its points in the
/// same transaction.
async fn apply_decision(
    pool: &DbPool,
    request: &ApprovalRequest,
    approver_id: &str,
    decision: Decision,
    message: Option<&str>,
) -> Result<DecisionOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE approval_requests
        SET status = ?, decided_on = ?, approver_id = ?, decision_msg = ?
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(decision.target_status().to_string())
    .bind(now_millis())
    .bind(approver_id)
    .bind(message)
    .bind(request.id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // another approver got there first; dropping the transaction rolls it back
        return Ok(DecisionOutcome::AlreadyDecided);
    }

    if decision == Decision::Approve {
        let increment: i64 = sqlx::query_scalar(
            "SELECT point_increment FROM skills WHERE project_id = ? AND skill_id = ?",
        )
        .bind(&request.project_id)
        .bind(&request.skill_id)
        .fetch_one(&mut *tx)
        .await?;

        points::record_points(
            &mut tx,
            &request.project_id,
            &request.skill_id,
            &request.user_id,
            request.requested_on,
            increment,
        )
        .await?;
    }

    tx.commit().await?;
    Ok(DecisionOutcome::Success)
}

/// Per-call cache of user tags used during authorization.
#[derive(Debug, Default)]
struct TagCache {
    tags: HashMap<String, Vec<UserTag>>,
}

impl TagCache {
    async fn get(&mut self, pool: &DbPool, user_id: &str) -> Result<&[UserTag], AppError> {
        if !self.tags.contains_key(user_id) {
            let tags = users::get_user_tags(pool, user_id).await?;
            self.tags.insert(user_id.to_string(), tags);
        }
        Ok(self.tags.get(user_id).map(Vec::as_slice).unwrap_or_default())
    }
}

fn push_filters<'a>(
    query: &mut QueryBuilder<'a, Sqlite>,
    user_id: Option<&'a str>,
    skill_id: Option<&'a str>,
) {
    if let Some(user_id) = user_id {
        query.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(skill_id) = skill_id {
        query.push(" AND skill_id = ").push_bind(skill_id);
    }
}

/// Pending requests of a project, oldest submission first by default.
///
/// With `filter.approver_id` set, only requests that approver may decide
/// are listed.
pub async fn list_pending(
    pool: &DbPool,
    project_id: &str,
    filter: &ApprovalFilter,
    page: PageRequest,
    order_by: ApprovalOrderBy,
) -> Result<Page<ApprovalRequest>, AppError> {
    projects::ensure_exists(pool, project_id).await?;

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM approval_requests WHERE status = 'pending' AND project_id = ",
        REQUEST_COLUMNS
    ));
    query.push_bind(project_id);
    push_filters(&mut query, filter.user_id.as_deref(), filter.skill_id.as_deref());
    query.push(" ORDER BY ").push(order_by.sql());

    if let Some(approver_id) = filter.approver_id.as_deref() {
        // authorization depends on tags and rules, so it is applied in memory
        let candidates = query.build_query_as::<ApprovalRequest>().fetch_all(pool).await?;
        let scope = ApproverScope::load(pool, project_id, approver_id).await?;
        let mut tags = TagCache::default();
        let mut visible = Vec::new();
        for request in candidates {
            let user_tags = tags.get(pool, &request.user_id).await?;
            if scope.permits(&request.user_id, user_tags, &request.skill_id) {
                visible.push(request);
            }
        }
        return Ok(Page::from_vec(visible, page));
    }

    query
        .push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = query.build_query_as::<ApprovalRequest>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM approval_requests WHERE status = 'pending' AND project_id = ",
    );
    count.push_bind(project_id);
    push_filters(&mut count, filter.user_id.as_deref(), filter.skill_id.as_deref());
    let total_count: i64 = count.build_query_scalar().fetch_one(pool).await?;

    Ok(Page {
        items,
        total_count,
        page: page.page,
        page_size: page.page_size,
    })
}

/// Decided requests, most recent decision first.
///
/// `filter.approver_id` selects decisions made by that approver.
pub async fn list_history(
    pool: &DbPool,
    project_id: &str,
    filter: &ApprovalFilter,
    page: PageRequest,
) -> Result<Page<ApprovalRequest>, AppError> {
    projects::ensure_exists(pool, project_id).await?;

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM approval_requests WHERE status IN ('approved', 'rejected') AND project_id = ",
        REQUEST_COLUMNS
    ));
    query.push_bind(project_id);
    push_filters(&mut query, filter.user_id.as_deref(), filter.skill_id.as_deref());
    if let Some(approver_id) = filter.approver_id.as_deref() {
        query.push(" AND approver_id = ").push_bind(approver_id);
    }
    query
        .push(" ORDER BY decided_on DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let items = query.build_query_as::<ApprovalRequest>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(*) FROM approval_requests WHERE status IN ('approved', 'rejected') AND project_id = ",
    );
    count.push_bind(project_id);
    push_filters(&mut count, filter.user_id.as_deref(), filter.skill_id.as_deref());
    if let Some(approver_id) = filter.approver_id.as_deref() {
        count.push(" AND approver_id = ").push_bind(approver_id);
    }
    let total_count: i64 = count.build_query_scalar().fetch_one(pool).await?;

    Ok(Page {
        items,
        total_count,
        page: page.page,
        page_size: page.page_size,
    })
}

/// Rejections a user has not dismissed yet, most recent first.
pub async fn list_rejections_for_user(
    pool: &DbPool,
    project_id: &str,
    user_id: &str,
) -> Result<Vec<ApprovalRequest>, AppError> {
    let rejections = sqlx::query_as::<_, ApprovalRequest>(&format!(
        r#"
        SELECT {} FROM approval_requests
        WHERE project_id = ? AND user_id = ? AND status = 'rejected' AND hidden_from_user = 0
        ORDER BY decided_on DESC, id DESC
        "#,
        REQUEST_COLUMNS
    ))
    .bind(project_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rejections)
}

/// Hide one of the user's own rejections from their view.
///
/// Fails with `NotFound` unless the request is a rejection owned by `user_id`.
pub async fn remove_rejection_from_view(
    pool: &DbPool,
    project_id: &str,
    user_id: &str,
    request_id: i64,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE approval_requests SET hidden_from_user = 1
        WHERE project_id = ? AND id = ? AND user_id = ? AND status = 'rejected'
        "#,
    )
    .bind(project_id)
    .bind(request_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found_with_id(
            "Rejection",
            request_id.to_string(),
        ));
    }
    Ok(())
}

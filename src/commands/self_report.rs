//! Self-report submission and approval commands.

use crate::error::AppError;
use crate::models::{
    ApprovalFilter, ApprovalOrderBy, ApprovalRequest, BatchResult, Page, SelfReport, SubmitResult,
};
use crate::services::self_report;
use crate::services::validation::resolve_page;
use crate::state::AppState;
use serde::Deserialize;

/// Input for submit_self_report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInput {
    pub project_id: String,
    #[serde(flatten)]
    pub report: SelfReport,
}

/// Input for approve_requests and reject_requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInput {
    pub project_id: String,
    pub request_ids: Vec<i64>,
    pub approver_id: String,
    /// Shown to the submitting user on rejection.
    #[serde(default)]
    pub message: Option<String>,
}

/// Input for approve_request and reject_request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleDecisionInput {
    pub project_id: String,
    pub request_id: i64,
    pub approver_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Input for list_pending_requests and list_decided_requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestsInput {
    pub project_id: String,
    #[serde(default)]
    pub filter: ApprovalFilter,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub order_by: ApprovalOrderBy,
}

/// Input for rejection view commands.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionInput {
    pub project_id: String,
    pub user_id: String,
    pub request_id: Option<i64>,
}

/// Report a performed skill.
///
/// # Returns
/// Awarded points for honor-system skills, or the pending request id
pub async fn submit_self_report(
    state: &AppState,
    input: SubmitInput,
) -> Result<SubmitResult, AppError> {
    self_report::submit(&state.pool, &state.config, &input.project_id, input.report).await
}

/// Approve pending requests.
///
/// Every id gets its own outcome; earlier approvals stand even if later
/// ids fail.
pub async fn approve_requests(
    state: &AppState,
    input: DecisionInput,
) -> Result<BatchResult, AppError> {
    self_report::approve(
        &state.pool,
        &input.project_id,
        &input.request_ids,
        &input.approver_id,
    )
    .await
}

/// Reject pending requests with an optional explanation.
pub async fn reject_requests(
    state: &AppState,
    input: DecisionInput,
) -> Result<BatchResult, AppError> {
    self_report::reject(
        &state.pool,
        &state.config,
        &input.project_id,
        &input.request_ids,
        &input.approver_id,
        input.message.as_deref(),
    )
    .await
}

/// Approve one request.
///
/// Unlike the batch form, a request that cannot be decided is an error
/// (`NotFound`, `NotAuthorized` or `AlreadyDecided`).
pub async fn approve_request(state: &AppState, input: SingleDecisionInput) -> Result<(), AppError> {
    let batch = self_report::approve(
        &state.pool,
        &input.project_id,
        &[input.request_id],
        &input.approver_id,
    )
    .await?;
    single_outcome(batch, input.request_id)
}

/// Reject one request with an optional explanation.
pub async fn reject_request(state: &AppState, input: SingleDecisionInput) -> Result<(), AppError> {
    let batch = self_report::reject(
        &state.pool,
        &state.config,
        &input.project_id,
        &[input.request_id],
        &input.approver_id,
        input.message.as_deref(),
    )
    .await?;
    single_outcome(batch, input.request_id)
}

fn single_outcome(batch: BatchResult, request_id: i64) -> Result<(), AppError> {
    batch
        .outcomes
        .into_iter()
        .find(|o| o.request_id == request_id)
        .ok_or_else(|| AppError::internal(format!("no outcome for request {}", request_id)))?
        .into_result()
}

pub async fn get_request(
    state: &AppState,
    project_id: String,
    request_id: i64,
) -> Result<ApprovalRequest, AppError> {
    self_report::get_request(&state.pool, &project_id, request_id).await
}

/// Pending requests, oldest first unless `orderBy` says otherwise.
pub async fn list_pending_requests(
    state: &AppState,
    input: ListRequestsInput,
) -> Result<Page<ApprovalRequest>, AppError> {
    let page = resolve_page(input.page, input.page_size, &state.config)?;
    self_report::list_pending(
        &state.pool,
        &input.project_id,
        &input.filter,
        page,
        input.order_by,
    )
    .await
}

/// Approved and rejected requests, latest decision first.
pub async fn list_decided_requests(
    state: &AppState,
    input: ListRequestsInput,
) -> Result<Page<ApprovalRequest>, AppError> {
    let page = resolve_page(input.page, input.page_size, &state.config)?;
    self_report::list_history(&state.pool, &input.project_id, &input.filter, page).await
}

pub async fn list_rejections(
    state: &AppState,
    input: RejectionInput,
) -> Result<Vec<ApprovalRequest>, AppError> {
    self_report::list_rejections_for_user(&state.pool, &input.project_id, &input.user_id).await
}

/// Hide one of the caller's rejections.
pub async fn dismiss_rejection(state: &AppState, input: RejectionInput) -> Result<(), AppError> {
    let request_id = input
        .request_id
        .ok_or_else(|| AppError::validation_field("requestId is required", "requestId"))?;
    self_report::remove_rejection_from_view(
        &state.pool,
        &input.project_id,
        &input.user_id,
        request_id,
    )
    .await
}

//! Self-report approval request models.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Check if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl From<&str> for ApprovalStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A self-reported event waiting for, or having received, an approver decision.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    /// Request ID.
    pub id: i64,

    pub project_id: String,

    pub skill_id: String,

    /// Submitting user.
    pub user_id: String,

    /// When the user performed the skill (Unix millis).
    pub requested_on: i64,

    /// Optional justification from the user.
    pub request_msg: Option<String>,

    /// Status: `pending`, `approved`, `rejected`.
    pub status: String,

    /// When the decision was made (Unix millis).
    pub decided_on: Option<i64>,

    /// Rejection explanation shown to the user.
    pub decision_msg: Option<String>,

    /// Approver who made the decision.
    pub approver_id: Option<String>,

    /// Whether the user dismissed this rejection from their view.
    #[sqlx(default)]
    pub hidden_from_user: bool,
}

impl ApprovalRequest {
    /// Parse the status string into an enum.
    pub fn status_enum(&self) -> ApprovalStatus {
        ApprovalStatus::from(self.status.as_str())
    }

    /// Check if the request still awaits a decision.
    pub fn is_pending(&self) -> bool {
        self.status_enum() == ApprovalStatus::Pending
    }
}

/// A user reporting that they performed a skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfReport {
    pub skill_id: String,
    pub user_id: String,
    /// When the skill was performed (Unix millis).
    pub performed_on: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outcome of a self-report submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    /// Points were awarded right away (honor system).
    pub awarded: bool,
    /// Points added to the user by this submission.
    pub points_earned: i64,
    /// Pending request created for approval skills.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i64>,
}

/// Which decision an approver is making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Status the request moves to.
    pub fn target_status(&self) -> ApprovalStatus {
        match self {
            Self::Approve => ApprovalStatus::Approved,
            Self::Reject => ApprovalStatus::Rejected,
        }
    }
}

/// Per-request result inside a batch decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DecisionOutcome {
    Success,
    AlreadyDecided,
    NotAuthorized,
    NotFound,
}

/// Result for one request ID of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOutcome {
    pub request_id: i64,
    pub outcome: DecisionOutcome,
}

impl RequestOutcome {
    /// Turn a failed outcome into the matching error.
    pub fn into_result(self) -> Result<(), AppError> {
        match self.outcome {
            DecisionOutcome::Success => Ok(()),
            DecisionOutcome::AlreadyDecided => Err(AppError::already_decided(self.request_id)),
            DecisionOutcome::NotAuthorized => Err(AppError::not_authorized(format!(
                "approver may not decide request {}",
                self.request_id
            ))),
            DecisionOutcome::NotFound => Err(AppError::not_found_with_id(
                "ApprovalRequest",
                self.request_id.to_string(),
            )),
        }
    }
}

/// Result of approving or rejecting several requests at once.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Number of requests that transitioned.
    pub decided: usize,
    /// One entry per submitted ID, in submission order.
    pub outcomes: Vec<RequestOutcome>,
}

impl BatchResult {
    /// Record the outcome for one request.
    pub fn push(&mut self, request_id: i64, outcome: DecisionOutcome) {
        if outcome == DecisionOutcome::Success {
            self.decided += 1;
        }
        self.outcomes.push(RequestOutcome { request_id, outcome });
    }

    /// Look up the outcome recorded for a request.
    pub fn outcome_for(&self, request_id: i64) -> Option<DecisionOutcome> {
        self.outcomes
            .iter()
            .find(|o| o.request_id == request_id)
            .map(|o| o.outcome)
    }
}

/// Filters for the pending and history lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApprovalFilter {
    /// Only requests from this user.
    pub user_id: Option<String>,
    /// Only requests for this skill.
    pub skill_id: Option<String>,
    /// Only requests this approver may decide.
    pub approver_id: Option<String>,
}

/// Sortable request fields, one per recorded column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApprovalSortField {
    Id,
    #[default]
    RequestedOn,
    UserId,
    SkillId,
    RequestMsg,
    Status,
    DecidedOn,
    DecisionMsg,
    ApproverId,
}

impl ApprovalSortField {
    /// Column backing the field.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::RequestedOn => "requested_on",
            Self::UserId => "user_id",
            Self::SkillId => "skill_id",
            Self::RequestMsg => "request_msg",
            Self::Status => "status",
            Self::DecidedOn => "decided_on",
            Self::DecisionMsg => "decision_msg",
            Self::ApproverId => "approver_id",
        }
    }
}

/// Sort order for the pending list. Defaults to oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApprovalOrderBy {
    pub field: ApprovalSortField,
    pub descending: bool,
}

impl ApprovalOrderBy {
    /// `ORDER BY` clause, with `id` as a stable tie-breaker.
    pub fn sql(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {}, id {}", self.field.column(), direction, direction)
    }
}

//! Approver workload commands.

use crate::error::AppError;
use crate::models::{WorkloadRule, WorkloadRuleInput};
use crate::services::workload;
use crate::state::AppState;
use serde::Deserialize;

/// Input for upsert_workload_rule.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRuleInput {
    pub project_id: String,
    #[serde(flatten)]
    pub rule: WorkloadRuleInput,
}

pub async fn get_workload(
    state: &AppState,
    project_id: String,
    approver_id: String,
) -> Result<Vec<WorkloadRule>, AppError> {
    workload::get_workload(&state.pool, &project_id, &approver_id).await
}

/// Create a rule, or edit the one named by `id`.
pub async fn upsert_workload_rule(
    state: &AppState,
    input: UpsertRuleInput,
) -> Result<WorkloadRule, AppError> {
    workload::upsert_workload_rule(&state.pool, &input.project_id, input.rule).await
}

/// Delete a rule. Unknown rule ids are ignored.
pub async fn delete_workload_rule(
    state: &AppState,
    project_id: String,
    rule_id: i64,
) -> Result<(), AppError> {
    if !workload::delete_workload_rule(&state.pool, &project_id, rule_id).await? {
        log::debug!("Workload rule {} not present in {}", rule_id, project_id);
    }
    Ok(())
}

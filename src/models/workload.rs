//! Approver workload rules.

use super::user::UserTag;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// What a workload rule matches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WorkloadCriterion {
    /// Requests from one specific user.
    #[serde(rename_all = "camelCase")]
    User { user_id: String },
    /// Requests from users carrying a tag.
    #[serde(rename_all = "camelCase")]
    Tag { tag_key: String, tag_value: String },
    /// Requests for one skill.
    #[serde(rename_all = "camelCase")]
    Skill { skill_id: String },
}

impl WorkloadCriterion {
    /// Check whether a request from `user_id` (carrying `user_tags`) on `skill_id` matches.
    pub fn matches(&self, user_id: &str, user_tags: &[UserTag], skill_id: &str) -> bool {
        match self {
            Self::User { user_id: rule_user } => rule_user == user_id,
            Self::Tag { tag_key, tag_value } => user_tags
                .iter()
                .any(|t| &t.tag_key == tag_key && &t.tag_value == tag_value),
            Self::Skill { skill_id: rule_skill } => rule_skill == skill_id,
        }
    }

    /// Column values in `(user_id, tag_key, tag_value, skill_id)` order.
    pub fn columns(&self) -> (Option<&str>, Option<&str>, Option<&str>, Option<&str>) {
        match self {
            Self::User { user_id } => (Some(user_id), None, None, None),
            Self::Tag { tag_key, tag_value } => (None, Some(tag_key), Some(tag_value), None),
            Self::Skill { skill_id } => (None, None, None, Some(skill_id)),
        }
    }
}

/// Stored workload rule row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRule {
    pub id: i64,
    pub project_id: String,
    pub approver_id: String,
    pub user_id: Option<String>,
    pub tag_key: Option<String>,
    pub tag_value: Option<String>,
    pub skill_id: Option<String>,
    pub created_at: i64,
}

impl WorkloadRule {
    /// Rebuild the criterion from the nullable columns.
    ///
    /// The table's CHECK constraint guarantees exactly one criterion is set.
    pub fn criterion(&self) -> Option<WorkloadCriterion> {
        match (&self.user_id, &self.tag_key, &self.tag_value, &self.skill_id) {
            (Some(user_id), None, None, None) => Some(WorkloadCriterion::User {
                user_id: user_id.clone(),
            }),
            (None, Some(tag_key), Some(tag_value), None) => Some(WorkloadCriterion::Tag {
                tag_key: tag_key.clone(),
                tag_value: tag_value.clone(),
            }),
            (None, None, None, Some(skill_id)) => Some(WorkloadCriterion::Skill {
                skill_id: skill_id.clone(),
            }),
            _ => None,
        }
    }

    /// Check whether the rule matches a request.
    pub fn matches(&self, user_id: &str, user_tags: &[UserTag], skill_id: &str) -> bool {
        self.criterion()
            .is_some_and(|c| c.matches(user_id, user_tags, skill_id))
    }
}

/// Input for creating or editing a workload rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadRuleInput {
    /// Existing rule to edit; a new rule is created when absent.
    pub id: Option<i64>,
    pub approver_id: String,
    pub criterion: WorkloadCriterion,
}

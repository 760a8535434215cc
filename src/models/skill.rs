//! Skill model and self-reporting modes.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How a skill accepts self-reported events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfReportingType {
    /// Self reporting is not allowed.
    Disabled,
    /// Points are awarded as soon as the user reports.
    HonorSystem,
    /// Reports become pending requests an approver must decide.
    Approval,
}

impl From<&str> for SelfReportingType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "honor_system" | "honorsystem" => Self::HonorSystem,
            "approval" => Self::Approval,
            _ => Self::Disabled,
        }
    }
}

impl std::fmt::Display for SelfReportingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::HonorSystem => write!(f, "honor_system"),
            Self::Approval => write!(f, "approval"),
        }
    }
}

/// A skill users earn points on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    /// Owning project.
    pub project_id: String,

    /// Identifier, unique within the project.
    pub skill_id: String,

    /// Display name.
    pub name: String,

    /// Points awarded per occurrence.
    pub point_increment: i64,

    /// Occurrences needed to complete the skill.
    pub num_perform_to_completion: i64,

    /// Self reporting mode: `disabled`, `honor_system`, `approval`.
    pub self_reporting_type: String,

    /// Creation timestamp (Unix millis).
    pub created_at: i64,

    /// Last edit timestamp (Unix millis).
    pub updated_at: i64,
}

impl Skill {
    /// Parse the self reporting mode into an enum.
    pub fn self_reporting_enum(&self) -> SelfReportingType {
        SelfReportingType::from(self.self_reporting_type.as_str())
    }

    /// Points needed to complete the skill.
    pub fn total_points(&self) -> i64 {
        self.point_increment * self.num_perform_to_completion
    }
}

/// Data required to create or edit a skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    pub skill_id: String,
    pub name: String,
    pub point_increment: i64,
    pub num_perform_to_completion: i64,
    pub self_reporting_type: SelfReportingType,
}

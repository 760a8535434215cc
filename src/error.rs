//! Application error types for the workflow boundary.
//!
//! These errors are serializable and can be returned from commands
//! to give the REST layer a structured explanation of what went wrong.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors returned from commands and services.
///
/// All variants serialize to a structured JSON object for the caller.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
    },

    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Adding a dependency would close a cycle in the skill graph.
    #[error("Discovered circular dependency [{display}]")]
    CircularDependency {
        /// Skill ids along the cycle, first and last are the same skill.
        path: Vec<String>,
        /// `proj:skillA -> proj:skillB -> proj:skillA`
        display: String,
    },

    /// Prerequisite skills are not yet completed by the user.
    #[error("Not all dependencies of skill {skill_id} are achieved: {}", unmet.join(", "))]
    DependencyNotMet { skill_id: String, unmet: Vec<String> },

    /// The same self-report was already submitted.
    #[error("Duplicate submission: {message}")]
    DuplicateSubmission { message: String },

    /// Approval request already has a terminal status.
    #[error("Approval request {request_id} was already decided")]
    AlreadyDecided { request_id: i64 },

    /// Caller is not allowed to perform the operation.
    #[error("Not authorized: {message}")]
    NotAuthorized { message: String },

    /// Skill does not accept self-reported events.
    #[error("Self reporting is not enabled for skill {skill_id}")]
    SelfReportDisabled { skill_id: String },

    /// Invalid input provided.
    #[error("Invalid input: {message}")]
    Validation {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            operation: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create a circular dependency error from the skill ids along the cycle.
    pub fn circular_dependency(project_id: &str, path: Vec<String>) -> Self {
        let display = path
            .iter()
            .map(|skill_id| format!("{}:{}", project_id, skill_id))
            .collect::<Vec<_>>()
            .join(" -> ");
        Self::CircularDependency { path, display }
    }

    /// Create a dependency not met error.
    pub fn dependency_not_met(skill_id: impl Into<String>, unmet: Vec<String>) -> Self {
        Self::DependencyNotMet {
            skill_id: skill_id.into(),
            unmet,
        }
    }

    /// Create a duplicate submission error.
    pub fn duplicate_submission(message: impl Into<String>) -> Self {
        Self::DuplicateSubmission {
            message: message.into(),
        }
    }

    /// Create an already decided error.
    pub fn already_decided(request_id: i64) -> Self {
        Self::AlreadyDecided { request_id }
    }

    /// Create a not authorized error.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::NotAuthorized {
            message: message.into(),
        }
    }

    /// Create a self report disabled error.
    pub fn self_report_disabled(skill_id: impl Into<String>) -> Self {
        Self::SelfReportDisabled {
            skill_id: skill_id.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a validation error with field name.
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get the cycle path if this is a circular dependency error.
    pub fn cycle_path(&self) -> Option<&[String]> {
        match self {
            Self::CircularDependency { path, .. } => Some(path),
            _ => None,
        }
    }
}

// Conversions from common error types

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}

impl From<crate::db::DbError> for AppError {
    fn from(err: crate::db::DbError) -> Self {
        Self::database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = AppError::database("connection failed");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"Database\""));
        assert!(json.contains("connection failed"));
    }

    #[test]
    fn test_circular_dependency_display() {
        let err = AppError::circular_dependency(
            "proj1",
            vec!["skill2".into(), "skill1".into(), "skill2".into()],
        );
        assert_eq!(
            err.to_string(),
            "Discovered circular dependency [proj1:skill2 -> proj1:skill1 -> proj1:skill2]"
        );
        assert_eq!(err.cycle_path().unwrap().len(), 3);
    }

    #[test]
    fn test_not_found_with_id() {
        let err = AppError::not_found_with_id("Skill", "skill1");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"resource\":\"Skill\""));
        assert!(json.contains("\"id\":\"skill1\""));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_optional_fields_not_serialized() {
        let err = AppError::validation("bad");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("field"));
    }

    #[test]
    fn test_decision_errors_serialize() {
        let json = serde_json::to_value(AppError::already_decided(7)).unwrap();
        assert_eq!(json["type"], "AlreadyDecided");
        assert_eq!(json["details"]["request_id"], 7);

        let err = AppError::not_authorized("mallory may not decide requests in proj1");
        assert_eq!(
            err.to_string(),
            "Not authorized: mallory may not decide requests in proj1"
        );
    }

    #[test]
    fn test_dependency_not_met_lists_skills() {
        let err = AppError::dependency_not_met("skill3", vec!["skill1".into(), "skill2".into()]);
        assert_eq!(
            err.to_string(),
            "Not all dependencies of skill skill3 are achieved: skill1, skill2"
        );
    }
}

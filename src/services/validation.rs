//! Field validation.
//!
//! Pure functions shared by every service entry point. A UI may call the same
//! functions for immediate feedback, but the services always run them.

use crate::config::{EngineConfig, ID_MAX_LEN, ID_MIN_LEN, NAME_MAX_LEN, NAME_MIN_LEN};
use crate::error::AppError;
use crate::models::PageRequest;

/// Maximum length of user identifiers (user names, emails, DNs).
pub const USER_ID_MAX_LEN: usize = 255;

/// Validate a project or skill identifier: 3-50 chars of `[A-Za-z0-9_]`.
pub fn validate_id(value: &str, field: &str) -> Result<(), AppError> {
    let len = value.chars().count();
    if !(ID_MIN_LEN..=ID_MAX_LEN).contains(&len) {
        return Err(AppError::validation_field(
            format!(
                "{} must be between {} and {} characters",
                field, ID_MIN_LEN, ID_MAX_LEN
            ),
            field,
        ));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::validation_field(
            format!("{} may only contain letters, numbers and underscores", field),
            field,
        ));
    }
    Ok(())
}

/// Validate a display name: 3-100 chars after trimming.
pub fn validate_name(value: &str, field: &str) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(AppError::validation_field(
            format!(
                "{} must be between {} and {} characters",
                field, NAME_MIN_LEN, NAME_MAX_LEN
            ),
            field,
        ));
    }
    Ok(())
}

/// Validate a user identifier: non-blank and bounded.
pub fn validate_user_id(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation_field(
            format!("{} is required", field),
            field,
        ));
    }
    if value.chars().count() > USER_ID_MAX_LEN {
        return Err(AppError::validation_field(
            format!("{} must be at most {} characters", field, USER_ID_MAX_LEN),
            field,
        ));
    }
    Ok(())
}

/// Validate an inclusive numeric range.
pub fn validate_range(value: i64, min: i64, max: i64, field: &str) -> Result<(), AppError> {
    if value < min || value > max {
        return Err(AppError::validation_field(
            format!("{} must be between {} and {}", field, min, max),
            field,
        ));
    }
    Ok(())
}

/// Validate an optional free-text message against the configured maximum.
pub fn validate_message(value: Option<&str>, max_len: usize, field: &str) -> Result<(), AppError> {
    match value {
        Some(msg) if msg.chars().count() > max_len => Err(AppError::validation_field(
            format!("{} must be at most {} characters", field, max_len),
            field,
        )),
        _ => Ok(()),
    }
}

/// Validate a non-blank tag key or value.
pub fn validate_tag_part(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation_field(
            format!("{} is required", field),
            field,
        ));
    }
    Ok(())
}

/// Resolve optional paging arguments against the configured defaults.
pub fn resolve_page(
    page: Option<u32>,
    page_size: Option<u32>,
    config: &EngineConfig,
) -> Result<PageRequest, AppError> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(config.default_page_size);

    if page == 0 {
        return Err(AppError::validation_field("page starts at 1", "page"));
    }
    if page_size == 0 || page_size > config.max_page_size {
        return Err(AppError::validation_field(
            format!("pageSize must be between 1 and {}", config.max_page_size),
            "pageSize",
        ));
    }
    Ok(PageRequest::new(page, page_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: AppError) -> Option<String> {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_id_bounds() {
        assert!(validate_id("abc", "skillId").is_ok());
        assert!(validate_id(&"a".repeat(50), "skillId").is_ok());
        assert_eq!(
            field_of(validate_id("ab", "skillId").unwrap_err()),
            Some("skillId".to_string())
        );
        assert!(validate_id(&"a".repeat(51), "skillId").is_err());
    }

    #[test]
    fn test_id_characters() {
        assert!(validate_id("skill_1", "skillId").is_ok());
        assert!(validate_id("skill-1", "skillId").is_err());
        assert!(validate_id("skill 1", "skillId").is_err());
    }

    #[test]
    fn test_name_bounds() {
        assert!(validate_name("Skill 1", "name").is_ok());
        assert!(validate_name("  ab  ", "name").is_err());
        assert!(validate_name(&"n".repeat(100), "name").is_ok());
        assert!(validate_name(&"n".repeat(101), "name").is_err());
    }

    #[test]
    fn test_range_and_message() {
        assert!(validate_range(1, 1, 10_000, "pointIncrement").is_ok());
        assert!(validate_range(0, 1, 10_000, "pointIncrement").is_err());
        assert!(validate_message(None, 5, "message").is_ok());
        assert!(validate_message(Some("12345"), 5, "message").is_ok());
        assert!(validate_message(Some("123456"), 5, "message").is_err());
    }

    #[test]
    fn test_user_id() {
        assert!(validate_user_id("approver@skills.org", "userId").is_ok());
        assert!(validate_user_id("   ", "userId").is_err());
    }

    #[test]
    fn test_resolve_page_defaults() {
        let config = EngineConfig::default();
        let page = resolve_page(None, None, &config).unwrap();
        assert_eq!(page, PageRequest::new(1, config.default_page_size));

        assert!(resolve_page(Some(0), None, &config).is_err());
        assert!(resolve_page(None, Some(config.max_page_size + 1), &config).is_err());
    }
}

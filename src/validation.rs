/// Input validation shared by the handlers and managers
use crate::error::{ApiError, ApiResult};
use validator::ValidateEmail;

/// Trimmed text, or `InvalidInput(message)` if missing or blank
pub fn require_text(value: Option<&str>, message: &str) -> ApiResult<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ApiError::InvalidInput(message.to_string())),
    }
}

/// Optional text: blank counts as absent
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Validate email format
pub fn require_email(email: &str) -> ApiResult<()> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(ApiError::InvalidInput("Provide email in right format".to_string()))
    }
}

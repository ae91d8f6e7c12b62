//! Free-text field checks shared by entity drafts.

use serde_json::json;

use super::Error;

fn field_error(field: &str, message: String, code: &str) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "code": code,
    }))
}

/// Trim `value` and require 1..=`max` characters.
///
/// # Examples
/// ```
/// use backoffice::domain::required_text;
///
/// assert_eq!(required_text("name", "  Cola ", 10).unwrap(), "Cola");
/// assert!(required_text("name", "   ", 10).is_err());
/// ```
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(field_error(
            field,
            format!("{field} must not be empty"),
            "empty",
        ));
    }
    if trimmed.chars().count() > max {
        return Err(field_error(
            field,
            format!("{field} must be at most {max} characters"),
            "too_long",
        ));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional value; blank input collapses to `None`.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => required_text(field, trimmed, max).map(Some),
    }
}

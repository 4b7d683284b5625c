use crate::domain::complaint::Complaint;
use crate::domain::error::{AppError, Result};
use reqwest::StatusCode;
use serde_json::Value;

/// Picks the server's own message out of an error body.
///
/// The backend reports failures as `{"message": "..."}`, some endpoints use
/// `{"error": "..."}`. Returns `None` for bodies without either.
pub fn extract_error_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<Value>(body).ok()?;
    ["message", "error"].iter().find_map(|key| {
        json.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// `"502 Bad Gateway"` style text for logs.
pub fn status_text(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// Maps a non-success response to an error. Only a message the server sent
/// becomes `NotFound` / `ServiceError`; anything else is an `HttpError`
/// carrying the status text.
pub fn error_for_status(status: StatusCode, body: &str) -> AppError {
    match extract_error_message(body) {
        Some(message) if status == StatusCode::NOT_FOUND => AppError::NotFound(message),
        Some(message) => AppError::ServiceError(message),
        None => AppError::HttpError(status_text(status)),
    }
}

/// Complaint listings come back either as a bare array or wrapped in a
/// `data` / `content` envelope (paged responses).
pub fn parse_complaint_list(body: Value) -> Result<Vec<Complaint>> {
    let items = match body {
        items @ Value::Array(_) => items,
        Value::Object(mut map) => ["data", "content", "complaints"]
            .iter()
            .find_map(|key| map.remove(*key).filter(Value::is_array))
            .ok_or_else(|| {
                AppError::ParseError("Invalid response format: missing complaint list".to_string())
            })?,
        _ => {
            return Err(AppError::ParseError(
                "Invalid response format: expected array or object".to_string(),
            ))
        }
    };

    serde_json::from_value(items)
        .map_err(|e| AppError::ParseError(format!("Failed to parse complaints: {}", e)))
}

/// Single complaint, optionally wrapped in a `data` envelope.
pub fn parse_complaint(body: Value) -> Result<Complaint> {
    let item = match body {
        Value::Object(mut map) if map.get("data").map(Value::is_object).unwrap_or(false) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    serde_json::from_value(item)
        .map_err(|e| AppError::ParseError(format!("Failed to parse complaint: {}", e)))
}

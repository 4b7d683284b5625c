use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppError {
    Internal(String),
    NotFound(String),
    ValidationError(String),
    ParseError(String),
    ServiceError(String),
    /// Non-success response whose body carried no message of its own.
    HttpError(String),
    NetworkError(String),
    ConfigError(String),
    IoError(String),
}

impl AppError {
    /// Message without the category prefix, suitable for showing to a user.
    pub fn user_message(&self) -> &str {
        match self {
            AppError::Internal(msg)
            | AppError::NotFound(msg)
            | AppError::ValidationError(msg)
            | AppError::ParseError(msg)
            | AppError::ServiceError(msg)
            | AppError::HttpError(msg)
            | AppError::NetworkError(msg)
            | AppError::ConfigError(msg)
            | AppError::IoError(msg) => msg,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            AppError::ServiceError(msg) => write!(f, "Service error: {}", msg),
            AppError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            AppError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::NetworkError("Request timed out".to_string())
        } else if err.is_decode() {
            AppError::ParseError(err.to_string())
        } else {
            AppError::NetworkError(format!("Request failed: {}", err))
        }
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes_category() {
        let err = AppError::ServiceError("Invalid or expired OTP".to_string());
        assert_eq!(err.to_string(), "Service error: Invalid or expired OTP");
    }

    #[test]
    fn test_user_message_strips_prefix() {
        let err = AppError::ValidationError("Please enter a valid 6-digit OTP".to_string());
        assert_eq!(err.user_message(), "Please enter a valid 6-digit OTP");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "portal.toml");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::IoError(msg) if msg.contains("portal.toml")));
    }
}

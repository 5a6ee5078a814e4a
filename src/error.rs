//! Unified application error model and presentation helpers.
//! This module provides a common error enum used across the API client, the
//! session manager and the console, along with mappers to user-facing text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("transport: {message}")]
    Transport { message: String },
    /// The backend answered non-2xx with an application message body.
    #[error("backend ({status}): {message}")]
    Backend { status: u16, message: String },
    /// A protected endpoint answered 403: the access token is expired or invalid.
    #[error("auth_expired: {message}")]
    AuthExpired { message: String },
    /// The response body could not be decoded into the expected shape.
    #[error("decode: {message}")]
    Decode { message: String },
    /// Local input validation failed before any network call was made.
    #[error("invalid {field}: {message}")]
    UserInput { field: String, message: String },
}

impl AppError {
    pub fn transport<S: Into<String>>(msg: S) -> Self { AppError::Transport { message: msg.into() } }
    pub fn auth_expired<S: Into<String>>(msg: S) -> Self { AppError::AuthExpired { message: msg.into() } }
    pub fn decode<S: Into<String>>(msg: S) -> Self { AppError::Decode { message: msg.into() } }
    pub fn user_input<S: Into<String>>(field: S, msg: S) -> Self {
        AppError::UserInput { field: field.into(), message: msg.into() }
    }

    /// Build the error for a non-2xx response. 403 is the documented signal for
    /// an expired/invalid token and is kept distinct so callers can recover.
    pub fn backend(status: u16, message: String) -> Self {
        if status == 403 {
            AppError::AuthExpired { message }
        } else {
            AppError::Backend { status, message }
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, AppError::AuthExpired { .. })
    }

    /// Map to the text shown to the user for a given action, mirroring the
    /// presentation rules: backend messages verbatim, transport failures as a
    /// generic "please try again".
    pub fn user_message(&self, action: &str) -> String {
        match self {
            AppError::Transport { .. } => format!("{}. Please try again.", action),
            AppError::Backend { message, .. } => format!("Error: {}", message),
            AppError::AuthExpired { message } => format!("Error: {}", message),
            AppError::Decode { .. } => format!("{}. Please try again.", action),
            AppError::UserInput { message, .. } => message.clone(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        // Requests that reached the server and failed are mapped via backend();
        // everything surfacing as a reqwest error is transport-level.
        AppError::Transport { message: err.to_string() }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode { message: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_constructor_separates_auth_expiry() {
        assert!(AppError::backend(403, "forbidden".into()).is_auth_expired());
        assert!(!AppError::backend(500, "boom".into()).is_auth_expired());
        assert!(!AppError::backend(404, "missing".into()).is_auth_expired());
    }

    #[test]
    fn user_message_presentation() {
        let net = AppError::transport("connection refused");
        assert_eq!(net.user_message("Failed to fetch students"), "Failed to fetch students. Please try again.");

        let backend = AppError::backend(409, "duplicate student id".into());
        assert_eq!(backend.user_message("Failed to submit form"), "Error: duplicate student id");

        let input = AppError::user_input("std_tel", "student phone number must be exactly 10 digits.");
        assert_eq!(input.user_message("Submit"), "student phone number must be exactly 10 digits.");
    }
}

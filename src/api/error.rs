//! API Error Types
//!
//! Classifies every failure the backend (or the network) can produce into
//! the small taxonomy the client reacts to: bad credentials, a rejected
//! token, field validation, missing resources, transport problems and
//! everything else the server answers with.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors returned by [`SocialApi`](super::SocialApi) calls
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Login was refused (wrong email or password)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The bearer token is missing, expired or revoked
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input was rejected, optionally with per-field messages
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Request did not complete in time
    #[error("Request timeout")]
    Timeout,

    /// Any other non-success status
    #[error("API error {status}: {message}")]
    Server { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Result type for API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body shapes the backend produces.
///
/// Validation failures come back as `{"message": "...", "errors": {"field": ["..."]}}`,
/// other failures as `{"message": "..."}` or `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

impl ApiError {
    /// Classify a non-success HTTP response
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                }
            });

        match status {
            401 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            400 | 422 => ApiError::Validation {
                message,
                fields: parsed.errors,
            },
            _ => ApiError::Server { status, message },
        }
    }

    /// Classify a transport-level failure
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout
        } else if error.is_connect() {
            ApiError::Network(error.to_string())
        } else if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }

    /// Shorthand for a validation error without field details
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Whether this failure means the token is no longer accepted
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Message suitable for showing to the user
    pub fn user_message(&self) -> String {
        match self {
            ApiError::InvalidCredentials => "Invalid email or password".to_string(),
            ApiError::Unauthorized(_) => "Your session has expired, please log in again".to_string(),
            ApiError::Validation { message, fields } if fields.is_empty() => message.clone(),
            ApiError::Validation { fields, .. } => fields
                .iter()
                .flat_map(|(field, messages)| {
                    messages.iter().map(move |m| format!("{}: {}", field, m))
                })
                .collect::<Vec<_>>()
                .join("; "),
            ApiError::NotFound(_) => "The requested item no longer exists".to_string(),
            ApiError::Network(_) | ApiError::Timeout => {
                "Could not reach the server, check your connection".to_string()
            }
            ApiError::Server { message, .. } => format!("Something went wrong: {}", message),
            ApiError::Decode(_) => "The server sent an unexpected response".to_string(),
        }
    }
}

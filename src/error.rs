//! Error types for the authority client and the session subsystem.

use crate::models::ErrorBody;

/// Application error types surfaced by the login and registration flows.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a rejection from a non-success status and the raw response body.
    pub fn rejected(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty());
        AppError::Rejected { status, message }
    }

    /// Text shown on a form: the authority's message verbatim, or `fallback`.
    pub fn form_message(&self, fallback: &str) -> String {
        match self {
            AppError::Rejected {
                message: Some(msg), ..
            }
            | AppError::BadRequest(msg) => msg.clone(),
            AppError::Internal(msg) => {
                // Log detailed error, show the generic message
                tracing::error!(error = %msg, "Internal client error");
                fallback.to_string()
            }
            AppError::Rejected { message: None, .. } | AppError::Transport(_) => {
                fallback.to_string()
            }
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Failure to reach the authority or to make sense of its answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError(err.to_string())
    }
}

/// Why a session ended up `Unauthenticated`.
///
/// Only logged; callers above the controller never branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("no token")]
    NoToken,

    #[error("invalid token")]
    InvalidToken,

    #[error("transport failure")]
    TransportFailure,
}

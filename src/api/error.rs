use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// An authenticated endpoint was called without a session.
    #[error("not logged in")]
    NotLoggedIn,
    /// The backend answered 401.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("server error ({status}): {message}")]
    Server { status: StatusCode, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The request could not be built from the given input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Errors that can only be recovered from by logging out.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::NotLoggedIn | ApiError::Unauthorized(_))
    }

    /// Text suitable for a notification, `fallback` is used when the backend
    /// didn't say anything useful.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Unauthorized(message) | ApiError::Server { message, .. }
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            ApiError::NotLoggedIn => "Please log in again".to_string(),
            _ => fallback.to_string(),
        }
    }
}

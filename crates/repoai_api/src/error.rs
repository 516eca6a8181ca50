use std::fmt;

use repoai_session::SessionError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum RepoApiError {
    InvalidBaseUrl(String),
    InvalidHeader(String),
    InvalidRepo(String),
    Request(reqwest::Error),
    /// Non-2xx answer without a usable `error` field.
    Status(StatusCode, String),
    /// Non-2xx answer carrying the backend's own `{"error": ...}` message.
    Backend {
        status: StatusCode,
        message: String,
    },
    Serde(JsonError),
    StreamInterrupted(String),
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

impl fmt::Display for RepoApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid base URL: {value}"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::InvalidRepo(message) => write!(f, "{message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, body) => write!(f, "HTTP {} {body}", status.as_u16()),
            Self::Backend { message, .. } => write!(f, "{message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::StreamInterrupted(message) => write!(f, "stream interrupted: {message}"),
            Self::Cancelled => write!(f, "request was cancelled"),
        }
    }
}

impl std::error::Error for RepoApiError {}

impl From<reqwest::Error> for RepoApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for RepoApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

impl From<RepoApiError> for SessionError {
    fn from(error: RepoApiError) -> Self {
        match error {
            RepoApiError::Backend { message, .. } => SessionError::Application(message),
            RepoApiError::Status(..) => SessionError::Application(error.to_string()),
            RepoApiError::InvalidRepo(message) => SessionError::Validation(message),
            RepoApiError::Request(error) => SessionError::Transport(error.to_string()),
            RepoApiError::StreamInterrupted(message) => SessionError::Transport(message),
            other => SessionError::Transport(other.to_string()),
        }
    }
}

/// Turn a non-2xx response into an error, preferring the backend's message.
pub fn error_from_response(status: StatusCode, body: &str) -> RepoApiError {
    match parse_error_message(body) {
        Some(message) => RepoApiError::Backend { status, message },
        None => {
            let body = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            };
            RepoApiError::Status(status, body)
        }
    }
}

/// Extract `error` from a `{"error": "..."}` body, if present and non-empty.
pub fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()?
        .error
        .filter(|message| !message.trim().is_empty())
}

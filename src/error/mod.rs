//! Error types for API and session operations

pub mod handlers;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures raised by the HTTP client pipeline and session storage.
///
/// The client never interprets what a failure means for the user; it only
/// classifies it. Translation into user-facing messages happens in
/// [`handlers::AuthErrorHandler`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (connection refused, DNS, timeout, ...)
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The server answered with a non-success status
    #[error("Request failed with status {status}")]
    Status { status: StatusCode, body: Value },
    /// Response body could not be read or decoded
    #[error("Decode error: {0}")]
    Decode(String),
    /// Session storage could not be read or written
    #[error("Session storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The outgoing request could not be built
    #[error("Invalid request: {0}")]
    Request(String),
}

impl ClientError {
    /// Status code of the response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded error payload, if a response was received.
    pub fn body(&self) -> Option<&Value> {
        match self {
            ClientError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// True when the server was never reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ClientError::Request(err.to_string())
        } else if err.is_decode() || err.is_body() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Configuration(err.to_string())
    }
}

/// A failed session operation, reduced to a single user-facing message.
///
/// The underlying [`ClientError`] is kept as the error source for logging but
/// callers are expected to display only [`AuthError::message`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AuthError {
    message: String,
    #[source]
    cause: ClientError,
}

impl AuthError {
    pub fn new(message: impl Into<String>, cause: ClientError) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &ClientError {
        &self.cause
    }
}

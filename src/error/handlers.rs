//! Translation of client failures into user-facing session messages

use crate::error::{AuthError, ClientError};
use reqwest::StatusCode;
use serde_json::Value;

pub const LOGIN_FAILED: &str = "could not start session";
pub const REGISTER_FAILED: &str = "could not create account";
pub const INCORRECT_CREDENTIALS: &str = "incorrect credentials";
pub const INVALID_DATA: &str = "invalid data";
pub const INVALID_SESSION: &str = "invalid session";

/// Standard error handler for session operations
pub struct AuthErrorHandler;

impl AuthErrorHandler {
    /// Handle a failed login attempt
    pub fn handle_login_error(err: ClientError) -> AuthError {
        let message = match err.status() {
            Some(StatusCode::UNAUTHORIZED) => INCORRECT_CREDENTIALS.to_string(),
            _ => Self::response_message(&err, LOGIN_FAILED),
        };
        AuthError::new(message, err)
    }

    /// Handle a failed registration. Registration has no wrong-credentials
    /// case, so a 401 falls through to the generic rules.
    pub fn handle_register_error(err: ClientError) -> AuthError {
        let message = Self::response_message(&err, REGISTER_FAILED);
        AuthError::new(message, err)
    }

    /// Every verification failure looks the same to the caller.
    pub fn handle_verify_error(err: ClientError) -> AuthError {
        AuthError::new(INVALID_SESSION, err)
    }

    /// Shared rules for the 422 and server-message cases.
    fn response_message(err: &ClientError, fallback: &str) -> String {
        let (status, body) = match err {
            ClientError::Status { status, body } => (*status, body),
            _ => return fallback.to_string(),
        };

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            return Self::validation_message(body);
        }

        Self::server_message(body).unwrap_or_else(|| fallback.to_string())
    }

    /// Flatten a `{"errors": {field: [messages]}}` payload in mapping order.
    pub fn validation_message(body: &Value) -> String {
        match body.get("errors") {
            Some(errors) if !errors.is_null() => {
                let messages = Self::flatten_errors(errors);
                if messages.is_empty() {
                    INVALID_DATA.to_string()
                } else {
                    messages.join(", ")
                }
            }
            _ => Self::server_message(body).unwrap_or_else(|| INVALID_DATA.to_string()),
        }
    }

    fn flatten_errors(errors: &Value) -> Vec<String> {
        let values: Vec<&Value> = match errors {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        let mut messages = Vec::new();
        for value in values {
            match value {
                Value::Array(items) => messages.extend(items.iter().filter_map(Self::as_text)),
                other => messages.extend(Self::as_text(other)),
            }
        }
        messages
    }

    fn as_text(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn server_message(body: &Value) -> Option<String> {
        body.get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

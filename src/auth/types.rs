use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login credentials, sent as the `username`/`password` form fields
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "username")]
    pub identifier: String,
    #[serde(rename = "password")]
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Registration payload, sent as JSON. Fields beyond the identifier and
/// secret are passed through untouched.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrationProfile {
    #[serde(rename = "email")]
    pub identifier: String,
    #[serde(rename = "password")]
    pub secret: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RegistrationProfile {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
            extra: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Debug for RegistrationProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationProfile")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .field("extra", &self.extra)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Access token in a login/register payload, if it carries a usable one
pub fn access_token(payload: &Value) -> Option<&str> {
    payload
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
}

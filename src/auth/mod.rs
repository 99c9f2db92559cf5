//! Authentication module for dashboard sessions
//!
//! This module provides login, registration, token verification and logout on
//! top of [`ApiClient`](crate::api::ApiClient), translating failures into
//! user-facing messages.

pub mod service;
pub mod types;

pub use service::{AuthResult, AuthService};
pub use types::{Credentials, RegistrationProfile, SessionState};

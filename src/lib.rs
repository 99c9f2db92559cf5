//! Market Client Library
//!
//! Client-side session layer for the market data dashboard API: a shared HTTP
//! client with bearer-token injection and 401-driven session invalidation, an
//! authentication service with user-facing error messages, and the market data
//! endpoints.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod output;
pub mod storage;

pub use api::{ApiClient, ApiClientBuilder, ApiResponse, MarketService};
pub use auth::{AuthService, Credentials, RegistrationProfile, SessionState};
pub use config::ClientConfig;
pub use error::{AuthError, ClientError, Result};
pub use events::{SessionEvent, SessionEvents};
pub use output::OutputManager;
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};

//! API module for market dashboard server interactions
//!
//! This module provides the shared HTTP client with its request/response stage
//! pipeline, and the market data endpoints built on top of it.

pub mod client;
pub mod markets;
pub mod pipeline;

pub use client::{ApiClient, ApiClientBuilder, ApiResponse};
pub use markets::{CandleQuery, MarketService};
pub use pipeline::{BearerAuthStage, Pipeline, RequestStage, ResponseStage, UnauthorizedStage};

//! Request/response stage pipeline
//!
//! Every call made through [`ApiClient`](crate::api::ApiClient) runs the
//! request stages in order before dispatch and the response stages in order
//! after it. The pipeline is assembled once when the client is built.

use crate::api::client::ApiResponse;
use crate::error::{ClientError, Result};
use crate::events::{SessionEvent, SessionEvents};
use crate::storage::SessionStore;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Stage applied to every outgoing request
#[async_trait]
pub trait RequestStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_request(&self, request: &mut reqwest::Request) -> Result<()>;
}

/// Stage applied to every completed call, successful or not.
///
/// A stage receives the outcome of the previous stage and returns the outcome
/// handed to the next one.
#[async_trait]
pub trait ResponseStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_response(&self, outcome: Result<ApiResponse>) -> Result<ApiResponse>;
}

/// Ordered request and response stages
#[derive(Clone, Default)]
pub struct Pipeline {
    request_stages: Vec<Arc<dyn RequestStage>>,
    response_stages: Vec<Arc<dyn ResponseStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard session pipeline: bearer injection, then 401 handling
    pub fn session(store: Arc<dyn SessionStore>, events: SessionEvents) -> Self {
        Self::new()
            .with_request_stage(BearerAuthStage::new(Arc::clone(&store)))
            .with_response_stage(UnauthorizedStage::new(store, events))
    }

    pub fn with_request_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.request_stages.push(Arc::new(stage));
        self
    }

    pub fn with_response_stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.response_stages.push(Arc::new(stage));
        self
    }

    pub fn request_stage_names(&self) -> Vec<&'static str> {
        self.request_stages.iter().map(|s| s.name()).collect()
    }

    pub fn response_stage_names(&self) -> Vec<&'static str> {
        self.response_stages.iter().map(|s| s.name()).collect()
    }

    /// All stage names in execution order
    pub fn stage_names(&self) -> Vec<&'static str> {
        let mut names = self.request_stage_names();
        names.extend(self.response_stage_names());
        names
    }

    pub async fn prepare(&self, request: &mut reqwest::Request) -> Result<()> {
        for stage in &self.request_stages {
            stage.on_request(request).await?;
        }
        Ok(())
    }

    pub async fn finish(&self, mut outcome: Result<ApiResponse>) -> Result<ApiResponse> {
        for stage in &self.response_stages {
            outcome = stage.on_response(outcome).await;
        }
        outcome
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("request_stages", &self.request_stage_names())
            .field("response_stages", &self.response_stage_names())
            .finish()
    }
}

/// Attaches `Authorization: Bearer <credential>` when a credential is stored
pub struct BearerAuthStage {
    store: Arc<dyn SessionStore>,
}

impl BearerAuthStage {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestStage for BearerAuthStage {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    async fn on_request(&self, request: &mut reqwest::Request) -> Result<()> {
        let token = match self.store.get().await {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(error = %e, "could not read session credential, sending request without it");
                return Ok(());
            }
        };

        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("stored credential is not a valid header value, skipping"),
        }
        Ok(())
    }
}

/// Drops the stored credential and notifies listeners when the server
/// answers 401. The original outcome is always passed on unchanged.
pub struct UnauthorizedStage {
    store: Arc<dyn SessionStore>,
    events: SessionEvents,
}

impl UnauthorizedStage {
    pub fn new(store: Arc<dyn SessionStore>, events: SessionEvents) -> Self {
        Self { store, events }
    }

    async fn invalidate(&self) {
        let had_token = match self.store.get().await {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "could not read session credential after 401");
                false
            }
        };

        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "could not clear rejected session credential");
        }

        if had_token {
            info!("session credential rejected by server, session invalidated");
            self.events.emit(SessionEvent::Invalidated);
        } else {
            debug!("401 received without a stored credential");
        }
    }
}

#[async_trait]
impl ResponseStage for UnauthorizedStage {
    fn name(&self) -> &'static str {
        "unauthorized"
    }

    async fn on_response(&self, outcome: Result<ApiResponse>) -> Result<ApiResponse> {
        if let Err(ClientError::Status { status, .. }) = &outcome {
            if *status == reqwest::StatusCode::UNAUTHORIZED {
                self.invalidate().await;
            }
        }
        outcome
    }
}

// Shared HTTP client for the market API. All server communication passes
// through ApiClient so that every call runs the same stage pipeline.

use crate::api::pipeline::{Pipeline, RequestStage, ResponseStage};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::SessionEvents;
use crate::storage::{FileSessionStore, SessionStore};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Successful response with its decoded body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn into_body(self) -> Value {
        self.body
    }
}

pub struct ApiClientBuilder {
    config: ClientConfig,
    store: Option<Arc<dyn SessionStore>>,
    events: Option<SessionEvents>,
    extra_stages: Vec<Box<dyn FnOnce(Pipeline) -> Pipeline + Send>>,
}

impl ApiClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            store: None,
            events: None,
            extra_stages: Vec::new(),
        }
    }

    /// Use a specific credential store instead of the file store in
    /// `config.session_dir`
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_events(mut self, events: SessionEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Append a request stage after the built-in bearer stage
    pub fn with_request_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.extra_stages
            .push(Box::new(move |pipeline| pipeline.with_request_stage(stage)));
        self
    }

    /// Append a response stage after the built-in 401 stage
    pub fn with_response_stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.extra_stages
            .push(Box::new(move |pipeline| pipeline.with_response_stage(stage)));
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        self.config.validate()?;
        let base_url = Url::parse(&self.config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Configuration(format!(
                "Base URL cannot carry a path: {}",
                self.config.base_url
            )));
        }

        let http = Client::builder()
            .timeout(self.config.timeout_duration())
            .build()
            .map_err(|e| ClientError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let store: Arc<dyn SessionStore> = match self.store {
            Some(store) => store,
            None => Arc::new(FileSessionStore::new(&self.config.session_dir)),
        };
        let events = self.events.unwrap_or_default();

        let mut pipeline = Pipeline::session(Arc::clone(&store), events.clone());
        for extend in self.extra_stages {
            pipeline = extend(pipeline);
        }

        Ok(ApiClient {
            inner: Arc::new(Inner {
                http,
                base_url,
                pipeline,
                store,
                events,
            }),
        })
    }
}

struct Inner {
    http: Client,
    base_url: Url,
    pipeline: Pipeline,
    store: Arc<dyn SessionStore>,
    events: SessionEvents,
}

/// Cheaply cloneable handle to the shared request pipeline
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("pipeline", &self.inner.pipeline)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: ClientConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn events(&self) -> &SessionEvents {
        &self.inner.events
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.inner.pipeline.stage_names()
    }

    /// Resolve path segments under the base URL. Each segment is
    /// percent-encoded, so values such as `BTC/USD` stay a single segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Configuration(format!(
                    "Base URL cannot carry a path: {}",
                    self.inner.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn get(&self, segments: &[&str]) -> Result<ApiResponse> {
        let url = self.endpoint(segments)?;
        let request = self.inner.http.request(Method::GET, url).build()?;
        self.send(request).await
    }

    pub async fn get_with_query<Q>(&self, segments: &[&str], query: &Q) -> Result<ApiResponse>
    where
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        let request = self.inner.http.request(Method::GET, url).query(query).build()?;
        self.send(request).await
    }

    /// POST an `application/x-www-form-urlencoded` body
    pub async fn post_form<F>(&self, segments: &[&str], form: &F) -> Result<ApiResponse>
    where
        F: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        let request = self.inner.http.request(Method::POST, url).form(form).build()?;
        self.send(request).await
    }

    pub async fn post_json<B>(&self, segments: &[&str], body: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        let request = self.inner.http.request(Method::POST, url).json(body).build()?;
        self.send(request).await
    }

    pub async fn post_empty(&self, segments: &[&str]) -> Result<ApiResponse> {
        let url = self.endpoint(segments)?;
        let request = self.inner.http.request(Method::POST, url).build()?;
        self.send(request).await
    }

    /// Run a prepared request through the full pipeline
    pub async fn send(&self, mut request: reqwest::Request) -> Result<ApiResponse> {
        let outcome = match self.inner.pipeline.prepare(&mut request).await {
            Ok(()) => self.dispatch(request).await,
            Err(e) => Err(e),
        };
        self.inner.pipeline.finish(outcome).await
    }

    async fn dispatch(&self, request: reqwest::Request) -> Result<ApiResponse> {
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, url = %url, "dispatching request");

        let response = self.inner.http.execute(request).await.map_err(|e| {
            debug!(%method, url = %url, error = %e, "request failed without a response");
            ClientError::from(e)
        })?;

        let status = response.status();
        debug!(%method, url = %url, status = status.as_u16(), "response received");

        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(ApiResponse {
                status,
                body: decode_body(&bytes),
            });
        }

        // Keep the status even when the body cannot be read
        let body = match response.bytes().await {
            Ok(bytes) => decode_body(&bytes),
            Err(e) => {
                debug!(%method, url = %url, error = %e, "could not read error response body");
                Value::Null
            }
        };
        Err(ClientError::Status { status, body })
    }
}

/// Empty bodies become `Null`, non-JSON bodies are kept as text
fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySessionStore;
    use serde_json::json;

    fn client(base: &str) -> ApiClient {
        ApiClient::builder(ClientConfig::new(base))
            .with_store(Arc::new(MemorySessionStore::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let api = client("http://localhost:8000/api/v1");
        assert_eq!(
            api.endpoint(&["auth", "login"]).unwrap().as_str(),
            "http://localhost:8000/api/v1/auth/login"
        );

        let api = client("http://localhost:8000/api/v1/");
        assert_eq!(
            api.endpoint(&["markets", "BTC/USD", "candles"]).unwrap().as_str(),
            "http://localhost:8000/api/v1/markets/BTC%2FUSD/candles"
        );
    }

    #[test]
    fn test_decode_body() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
        assert_eq!(decode_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(decode_body(b"Bad Gateway"), json!("Bad Gateway"));
    }

    #[test]
    fn test_build_rejects_bad_config() {
        let result = ApiClient::builder(ClientConfig::new("localhost:8000"))
            .with_store(Arc::new(MemorySessionStore::new()))
            .build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_default_stage_order() {
        assert_eq!(
            client("http://localhost:8000").stage_names(),
            vec!["bearer-auth", "unauthorized"]
        );
    }
}

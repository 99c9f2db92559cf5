// Shared mock API server for integration tests.
#![allow(dead_code)]

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::IntoResponse,
};
use async_trait::async_trait;
use market_client::{
    ApiClient, ClientConfig, ClientError, MemorySessionStore, SessionEvent, SessionStore,
};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

// Every mock route lives under this prefix, like the real API.
pub const API_PREFIX: &str = "/api/v1";

// One request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body should be json")
    }

    pub fn form(&self) -> HashMap<String, String> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }
}

// Canned responses keyed by (method, path) plus a log of received requests.
#[derive(Clone, Default)]
pub struct MockApi {
    routes: Arc<Mutex<HashMap<(String, String), (u16, Value)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    // Register the response for `method` + `path` (path relative to the API prefix).
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) -> &Self {
        self.routes.lock().unwrap().insert(
            (method.to_string(), format!("{API_PREFIX}{path}")),
            (status, body),
        );
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        let full = format!("{API_PREFIX}{path}");
        self.requests()
            .into_iter()
            .filter(|r| r.path == full)
            .collect()
    }

    // Serve on an ephemeral port and return the API base URL.
    pub async fn start(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral test port");
        let addr = listener.local_addr().expect("get local addr");
        let app = Router::new().fallback(handle).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server failed");
        });
        format!("http://{addr}{API_PREFIX}")
    }
}

async fn handle(
    State(api): State<MockApi>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    api.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body: body.to_vec(),
    });

    let canned = api
        .routes
        .lock()
        .unwrap()
        .get(&(method.to_string(), uri.path().to_string()))
        .cloned();
    let (status, body) = canned.unwrap_or((404, serde_json::json!({"message": "Not Found"})));

    (
        StatusCode::from_u16(status).expect("valid status"),
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

// Base URL of a port nothing listens on, for transport failures.
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    drop(listener);
    format!("http://{addr}{API_PREFIX}")
}

// Serve every connection a response whose body is shorter than its
// declared content-length, then close the connection.
pub async fn truncated_body_base_url(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
                body.len() + 200
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    format!("http://{addr}{API_PREFIX}")
}

// Consume one request (head plus content-length body) from the socket.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
    }
}

pub fn client(base_url: &str, store: Arc<MemorySessionStore>) -> ApiClient {
    client_with_store(base_url, store)
}

pub fn client_with_store(base_url: &str, store: Arc<dyn SessionStore>) -> ApiClient {
    ApiClient::builder(ClientConfig::new(base_url))
        .with_store(store)
        .build()
        .expect("client should build")
}

// Store holding an optional credential whose operations can be made to fail.
#[derive(Debug, Default)]
pub struct FailingSessionStore {
    token: Mutex<Option<String>>,
    pub fail_get: bool,
    pub fail_set: bool,
    pub fail_clear: bool,
}

impl FailingSessionStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
            ..Self::default()
        }
    }

    pub fn failing_get(mut self) -> Self {
        self.fail_get = true;
        self
    }

    pub fn failing_set(mut self) -> Self {
        self.fail_set = true;
        self
    }

    pub fn failing_clear(mut self) -> Self {
        self.fail_clear = true;
        self
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn get(&self) -> market_client::Result<Option<String>> {
        if self.fail_get {
            return Err(ClientError::Storage("session store unreadable".to_string()));
        }
        Ok(self.token())
    }

    async fn set(&self, token: &str) -> market_client::Result<()> {
        if self.fail_set {
            return Err(ClientError::Storage("session store read-only".to_string()));
        }
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> market_client::Result<()> {
        if self.fail_clear {
            return Err(ClientError::Storage("session store read-only".to_string()));
        }
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

// Count session-invalidated notifications emitted by the client.
pub fn count_invalidations(client: &ApiClient) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    client.events().subscribe(move |event: SessionEvent| {
        if event == SessionEvent::Invalidated {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    hits
}

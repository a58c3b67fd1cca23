//! Test utilities for integration tests.
//!
//! Provides token minting, an in-process stub of the Cuebot backend and a
//! helper to send requests through a gateway router.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use cue_rest_gateway::{
    create_router, DialOptions, GatewayMux, InterfaceRegistry, RouterConfig, TokenValidator,
};

pub const TEST_SECRET: &str = "test_secret";

// =============================================================================
// Tokens
// =============================================================================

pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Sign `claims` with HS256.
pub fn mint_token(claims: Value, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// A token for `test_user` valid for the next hour.
pub fn valid_token() -> String {
    mint_token(json!({ "sub": "test_user", "exp": now() + 3600 }), TEST_SECRET)
}

/// A token for `test_user` that expired an hour ago.
pub fn expired_token() -> String {
    mint_token(json!({ "sub": "test_user", "exp": now() - 3600 }), TEST_SECRET)
}

// =============================================================================
// Stub Backend
// =============================================================================

/// In-process stand-in for Cuebot that echoes every call as JSON.
pub struct StubBackend {
    pub addr: SocketAddr,
    calls: Arc<AtomicUsize>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/{interface}/{method}", post(echo))
            .fallback(stray)
            .with_state(Arc::clone(&calls));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, calls }
    }

    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    /// Number of calls the backend has received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn echo(
    State(calls): State<Arc<AtomicUsize>>,
    Path((interface, method)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Value> {
    calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "interface": interface,
        "method": method,
        "authorization": headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
        "body": serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null),
    }))
}

/// Any call outside `/{interface}/{method}` still counts.
async fn stray(State(calls): State<Arc<AtomicUsize>>) -> StatusCode {
    calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}

/// An address nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

// =============================================================================
// Gateway Helpers
// =============================================================================

/// The full OpenCue gateway router forwarding to `endpoint`.
pub fn gateway_router(endpoint: &str, config: &RouterConfig) -> Router {
    let mut mux = GatewayMux::new();
    InterfaceRegistry::opencue()
        .register_all(&mut mux, endpoint, &DialOptions::default())
        .unwrap();
    let validator = TokenValidator::from_secret(TEST_SECRET).unwrap();
    create_router(mux, validator, config)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

/// Send one request through `router`.
pub async fn send(
    router: Router,
    method: Method,
    path: &str,
    authorization: Option<&str>,
    body: impl Into<Body>,
) -> TestResponse {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }

    let response = router
        .oneshot(builder.body(body.into()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        headers,
        body,
    }
}

/// `Bearer <token>` header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

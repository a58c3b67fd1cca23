//! Authentication integration tests.
//!
//! Tests verify, through the full router:
//! - Valid credentials reach the backend
//! - Expired, wrongly signed and forged credentials are rejected
//! - Missing credentials are rejected
//! - Rejected requests never reach the backend

use axum::http::{header, Method, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use cue_rest_gateway::{BearerPolicy, RouterConfig};

use super::test_utils::{
    bearer, expired_token, gateway_router, mint_token, now, send, valid_token, StubBackend,
    TEST_SECRET,
};

const FIND_SHOW: &str = "/show.ShowInterface/FindShow";

/// Build a token with an arbitrary header, HMAC-SHA256 signed with `secret`.
fn forge(header: serde_json::Value, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(header.to_string());
    let claims = URL_SAFE_NO_PAD
        .encode(json!({ "sub": "test_user", "exp": now() + 3600 }).to_string());
    let signing_input = format!("{}.{}", header, claims);

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{}.{}", signing_input, signature)
}

// =============================================================================
// Accepted Credentials
// =============================================================================

#[tokio::test]
async fn test_valid_token_reaches_backend() {
    let backend = StubBackend::start().await;
    let router = gateway_router(&backend.endpoint(), &RouterConfig::new());
    let token = valid_token();

    let response = send(
        router,
        Method::POST,
        FIND_SHOW,
        Some(&bearer(&token)),
        r#"{"name": "test-show"}"#,
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["interface"], "show.ShowInterface");
    assert_eq!(json["method"], "FindShow");
    assert_eq!(json["body"], json!({ "name": "test-show" }));
    // The caller's credential is passed on unchanged
    assert_eq!(json["authorization"], bearer(&token));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_bare_token_accepted_by_default() {
    let backend = StubBackend::start().await;
    let router = gateway_router(&backend.endpoint(), &RouterConfig::new());

    let response = send(router, Method::POST, FIND_SHOW, Some(&valid_token()), "{}").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_strict_policy_requires_bearer_scheme() {
    let backend = StubBackend::start().await;
    let config = RouterConfig::new().with_bearer_policy(BearerPolicy::Strict);
    let token = valid_token();

    let response = send(
        gateway_router(&backend.endpoint(), &config),
        Method::POST,
        FIND_SHOW,
        Some(&token),
        "{}",
    )
    .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = send(
        gateway_router(&backend.endpoint(), &config),
        Method::POST,
        FIND_SHOW,
        Some(&bearer(&token)),
        "{}",
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    assert_eq!(backend.calls(), 1);
}

// =============================================================================
// Rejected Credentials
// =============================================================================

#[tokio::test]
async fn test_expired_token_rejected() {
    let backend = StubBackend::start().await;
    let router = gateway_router(&backend.endpoint(), &RouterConfig::new());

    let response = send(
        router,
        Method::POST,
        FIND_SHOW,
        Some(&bearer(&expired_token())),
        "{}",
    )
    .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.text().contains("expired"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_wrong_secret_rejected() {
    let backend = StubBackend::start().await;
    let router = gateway_router(&backend.endpoint(), &RouterConfig::new());
    let token = mint_token(
        json!({ "sub": "test_user", "exp": now() + 3600 }),
        "some_other_secret",
    );

    let response = send(router, Method::POST, FIND_SHOW, Some(&bearer(&token)), "{}").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_missing_header_rejected() {
    let backend = StubBackend::start().await;
    let router = gateway_router(&backend.endpoint(), &RouterConfig::new());

    let response = send(router, Method::POST, FIND_SHOW, None, "{}").await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.text(), "missing credential");
    assert_eq!(
        response.headers.get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_forged_algorithms_rejected() {
    let backend = StubBackend::start().await;
    let forged = [
        // Unsigned token
        format!(
            "{}.{}.",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(json!({ "sub": "x", "exp": now() + 3600 }).to_string())
        ),
        // Asymmetric algorithms keyed with the shared secret
        forge(json!({ "alg": "RS256", "typ": "JWT" }), TEST_SECRET),
        forge(json!({ "alg": "ES256", "typ": "JWT" }), TEST_SECRET),
    ];

    for token in forged {
        let router = gateway_router(&backend.endpoint(), &RouterConfig::new());
        let response = send(router, Method::POST, FIND_SHOW, Some(&bearer(&token)), "{}").await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", token);
        assert!(response.text().contains("unexpected signing method"));
    }

    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_malformed_tokens_rejected() {
    let backend = StubBackend::start().await;
    let malformed = ["Bearer ", "Bearer abc", "Bearer a.b", "Bearer a.b.c.d", "garbage"];

    for value in malformed {
        let router = gateway_router(&backend.endpoint(), &RouterConfig::new());
        let response = send(router, Method::POST, FIND_SHOW, Some(value), "{}").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", value);
    }

    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_every_interface_is_gated() {
    let backend = StubBackend::start().await;

    for interface in cue_rest_gateway::OPENCUE_INTERFACES {
        let router = gateway_router(&backend.endpoint(), &RouterConfig::new());
        let path = format!("/{}/AnyMethod", interface);
        let response = send(router, Method::POST, &path, None, "{}").await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", interface);
    }

    assert_eq!(backend.calls(), 0);
}

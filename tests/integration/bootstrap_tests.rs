//! Startup and shutdown integration tests.
//!
//! Tests verify:
//! - A real listener serves authenticated calls end to end
//! - Graceful shutdown makes the server return cleanly
//! - Startup failures are reported before anything is served

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use cue_rest_gateway::server::serve;
use cue_rest_gateway::{
    build_gateway, run_with, Config, ConfigError, GatewayError, InterfaceRegistry,
    RegistrationEntry, TranslatorError,
};

use super::test_utils::{bearer, valid_token, StubBackend, TEST_SECRET};

fn test_config(endpoint: &str, port: u16) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port,
        cuebot_endpoint: endpoint.to_string(),
        cuebot_tls: false,
        request_timeout: 5,
        jwt_secret: TEST_SECRET.to_string(),
        require_bearer: false,
        cors_origins: None,
        verbose: false,
        no_tracing: true,
    }
}

#[tokio::test]
async fn test_serves_over_tcp_until_shutdown() {
    let backend = StubBackend::start().await;
    let config = test_config(&backend.endpoint(), 0);
    let router = build_gateway(&config, &InterfaceRegistry::opencue()).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, router, async move {
        let _ = stopped.await;
    }));

    let client = reqwest::Client::new();
    let url = format!("http://{}/job.JobInterface/GetJobs", addr);

    let response = client
        .post(&url)
        .header("authorization", bearer(&valid_token()))
        .body(r#"{"r": {}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["interface"], "job.JobInterface");
    assert_eq!(json["method"], "GetJobs");

    let response = client.post(&url).body("{}").send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);

    assert_eq!(backend.calls(), 1);

    stop.send(()).unwrap();
    let result = server.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_empty_secret_fails_startup() {
    let mut config = test_config("localhost:8443", 0);
    config.jwt_secret = String::new();

    let result = run_with(config, &InterfaceRegistry::opencue(), async {}).await;

    assert!(matches!(
        result,
        Err(GatewayError::Config(ConfigError::MissingSecret))
    ));
}

#[tokio::test]
async fn test_registration_failure_stops_startup() {
    // A bind on this port would fail, so a Registration error proves no bind was tried
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut entries: Vec<_> = cue_rest_gateway::OPENCUE_INTERFACES[..20]
        .iter()
        .map(|name| RegistrationEntry::forwarding(*name))
        .collect();
    entries.push(RegistrationEntry::new(
        "task.TaskInterface",
        |_mux, _endpoint, _options| Err(TranslatorError::Client("refused".to_string())),
    ));
    let registry = InterfaceRegistry::new(entries);

    let result = run_with(test_config("localhost:8443", port), &registry, async {}).await;

    match result {
        Err(GatewayError::Registration(err)) => {
            assert_eq!(err.interface, "task.TaskInterface");
            assert_eq!(err.position, 20);
            assert!(err.to_string().contains("task.TaskInterface"));
        }
        other => panic!("expected registration error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_endpoint_fails_registration() {
    let result = build_gateway(
        &test_config("ftp://cuebot:21", 0),
        &InterfaceRegistry::opencue(),
    );

    match result {
        Err(GatewayError::Registration(err)) => {
            assert_eq!(err.position, 0);
            assert!(matches!(err.source, TranslatorError::InvalidEndpoint { .. }));
        }
        other => panic!("expected registration error, got {:?}", other.map(|_| ())),
    }
}

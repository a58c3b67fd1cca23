//! HTTP/JSON forwarding to the Cuebot backend.
//!
//! Each registered interface gets a [`Forwarder`] that relays
//! `POST /<package>.<Interface>/<Method>` calls to the same path on the
//! backend as unary JSON requests:
//!
//! ```text
//! client ──POST /job.JobInterface/GetJobs──► gateway ──POST /job.JobInterface/GetJobs──► backend
//!        ◄──── status + JSON body ─────────          ◄──── status + JSON body ──────────
//! ```
//!
//! Clients are built at registration time but connect lazily, so an
//! unreachable backend only surfaces when a request is forwarded.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, MethodRouter};
use bytes::{Bytes, BytesMut};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, Uri};
use tracing::{debug, warn};
use url::Url;

use super::interfaces::{is_identifier, split_interface_name};
use super::mux::GatewayMux;
use crate::error::{TranslationError, TranslatorError};

/// Default bound on a whole forwarded call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on establishing the backend connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default cap on a backend response body, the usual 4 MiB RPC message limit.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

const JSON: &str = "application/json";

// =============================================================================
// Dial options
// =============================================================================

/// Transport used to reach the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportSecurity {
    /// Plaintext HTTP
    #[default]
    Insecure,

    /// HTTPS with the bundled webpki roots
    Tls,
}

impl TransportSecurity {
    fn scheme(&self) -> &'static str {
        match self {
            TransportSecurity::Insecure => "http",
            TransportSecurity::Tls => "https",
        }
    }
}

/// Options shared by every backend client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialOptions {
    pub transport: TransportSecurity,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_response_bytes: usize,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            transport: TransportSecurity::Insecure,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl DialOptions {
    pub fn with_transport(mut self, transport: TransportSecurity) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    fn build_client(&self) -> Result<reqwest::Client, TranslatorError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| TranslatorError::Client(e.to_string()))
    }
}

/// Turn `host:port` (or a full URL) into the backend base URL.
///
/// An endpoint without a scheme gets `http://` or `https://` depending on
/// the transport.
pub fn resolve_base_url(
    endpoint: &str,
    transport: TransportSecurity,
) -> Result<Url, TranslatorError> {
    let invalid = |reason: String| TranslatorError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(invalid("endpoint is empty".to_string()));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("{}://{}", transport.scheme(), trimmed)
    };

    let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(url)
}

// =============================================================================
// Forwarder
// =============================================================================

/// Relays calls for one interface to the backend.
#[derive(Debug, Clone)]
pub struct Forwarder {
    interface: Arc<str>,
    base: Arc<str>,
    client: reqwest::Client,
    max_response_bytes: usize,
}

impl Forwarder {
    pub fn new(
        interface: &str,
        endpoint: &str,
        options: &DialOptions,
    ) -> Result<Self, TranslatorError> {
        if split_interface_name(interface).is_none() {
            return Err(TranslatorError::InvalidInterfaceName(interface.to_string()));
        }

        let base = resolve_base_url(endpoint, options.transport)?;
        let client = options.build_client()?;

        Ok(Self {
            interface: Arc::from(interface),
            base: Arc::from(base.as_str().trim_end_matches('/')),
            client,
            max_response_bytes: options.max_response_bytes,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Backend URL for `method` on this interface.
    ///
    /// Returns `None` unless `method` is a plain identifier, so a decoded
    /// path segment can never add segments, a query or a fragment.
    pub fn target(&self, method: &str) -> Option<String> {
        is_identifier(method).then(|| format!("{}/{}/{}", self.base, self.interface, method))
    }

    /// Forward one call, passing the backend's status, content type and
    /// body through.
    pub async fn forward(
        &self,
        method: &str,
        authorization: Option<&HeaderValue>,
        body: Bytes,
    ) -> Result<Response, TranslationError> {
        let target = self
            .target(method)
            .ok_or_else(|| TranslationError::UnknownMethod {
                interface: self.interface.to_string(),
                method: method.to_string(),
            })?;
        let body = normalize_body(body)?;

        let mut request = self
            .client
            .post(target)
            .header(CONTENT_TYPE, JSON)
            .body(body);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value.clone());
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.backend_failure(method, e))?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(JSON));
        let payload = self.read_body(method, response).await?;

        debug!(
            interface = %self.interface,
            method = method,
            status = status.as_u16(),
            bytes = payload.len(),
            "Forwarded call to backend"
        );

        Ok((status, [(CONTENT_TYPE, content_type)], payload).into_response())
    }

    /// Collect the backend body, giving up once it passes the size cap.
    async fn read_body(
        &self,
        method: &str,
        mut response: reqwest::Response,
    ) -> Result<Bytes, TranslationError> {
        let limit = self.max_response_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(self.oversized(method));
        }

        let mut payload = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.backend_failure(method, e))?
        {
            if payload.len() + chunk.len() > limit {
                return Err(self.oversized(method));
            }
            payload.extend_from_slice(&chunk);
        }
        Ok(payload.freeze())
    }

    fn oversized(&self, method: &str) -> TranslationError {
        let err = TranslationError::ResponseTooLarge {
            limit: self.max_response_bytes,
        };
        warn!(
            interface = %self.interface,
            method = method,
            error = %err,
            "Backend response dropped"
        );
        err
    }

    /// Mount this forwarder as a POST-only handler.
    pub fn into_method_router(self) -> MethodRouter {
        post(forward_handler)
            .fallback(method_not_allowed)
            .with_state(self)
    }

    fn backend_failure(&self, method: &str, err: reqwest::Error) -> TranslationError {
        let err = err.without_url();
        let mapped = if err.is_connect() {
            TranslationError::BackendUnavailable(err.to_string())
        } else if err.is_timeout() {
            TranslationError::DeadlineExceeded(err.to_string())
        } else {
            TranslationError::Backend(err.to_string())
        };

        warn!(
            interface = %self.interface,
            method = method,
            error = %mapped,
            "Backend call failed"
        );
        mapped
    }
}

/// Empty bodies become `{}`; anything else must parse as JSON.
fn normalize_body(body: Bytes) -> Result<Bytes, TranslationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Bytes::from_static(b"{}"));
    }

    serde_json::from_slice::<serde::de::IgnoredAny>(&body)
        .map_err(|e| TranslationError::InvalidJson(e.to_string()))?;
    Ok(body)
}

async fn forward_handler(
    State(forwarder): State<Forwarder>,
    Path(method): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, TranslationError> {
    forwarder
        .forward(&method, headers.get(AUTHORIZATION), body)
        .await
}

async fn method_not_allowed(method: Method, uri: Uri) -> TranslationError {
    TranslationError::MethodNotAllowed {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

/// Register `interface` on `mux`, forwarding its calls to `endpoint`.
///
/// No connection is opened here.
pub fn register_forwarding(
    mux: &mut GatewayMux,
    interface: &str,
    endpoint: &str,
    options: &DialOptions,
) -> Result<(), TranslatorError> {
    let forwarder = Forwarder::new(interface, endpoint, options)?;
    mux.handle(interface, forwarder.into_method_router());
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

//! Authentication gate for the combined handler.
//!
//! [`AuthGate`] wraps any tower service and runs every request through the
//! same sequence:
//!
//! ```text
//! Authorization header ──► strip scheme ──► validate token ──► inner service
//!        │ absent/empty         │ strict: not Bearer   │ error / inconsistent claims
//!        ▼                      ▼                      ▼
//!       401                    401                    401
//! ```
//!
//! Accepted requests reach the inner service untouched apart from the decoded
//! [`Claims`], which are added to the request extensions. Rejections are
//! `text/plain` 401 responses carrying the failure reason.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::{IntoResponse, Response};
use http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::token::{AuthError, Claims, TokenValidator};

// =============================================================================
// Scheme handling
// =============================================================================

/// How the `Authorization` header value is turned into a raw token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BearerPolicy {
    /// Strip a literal `Bearer ` prefix when present, otherwise use the
    /// whole header value as the token.
    #[default]
    Lenient,

    /// Require `Bearer <token>`; the scheme is matched case-insensitively.
    Strict,
}

impl BearerPolicy {
    /// Extract the raw token from a header value.
    pub fn extract<'a>(&self, value: &'a str) -> Result<&'a str, AuthError> {
        match self {
            BearerPolicy::Lenient => Ok(value.strip_prefix("Bearer ").unwrap_or(value)),
            BearerPolicy::Strict => {
                let (scheme, token) = value
                    .split_once(' ')
                    .ok_or(AuthError::UnsupportedScheme)?;
                if !scheme.eq_ignore_ascii_case("bearer") {
                    return Err(AuthError::UnsupportedScheme);
                }
                Ok(token.trim_start())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            self.to_string(),
        )
            .into_response()
    }
}

fn authenticate(
    validator: &TokenValidator,
    policy: BearerPolicy,
    headers: &HeaderMap,
) -> Result<Claims, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .filter(|value| !value.is_empty())
        .ok_or(AuthError::MissingCredential)?;
    let value = value.to_str().map_err(|_| {
        AuthError::Malformed("authorization header is not visible ASCII".to_string())
    })?;

    let token = policy.extract(value)?;
    let claims = validator.validate(token)?;

    if !claims.is_consistent() {
        return Err(AuthError::InvalidCredential);
    }

    Ok(claims)
}

fn record_rejection(method: &Method, uri: &Uri, err: &AuthError) {
    // Forged-looking credentials at warn, everything else at debug
    if err.is_suspicious() {
        warn!(
            method = %method,
            path = uri.path(),
            error_type = err.error_type(),
            "Authentication failed: {}",
            err
        );
    } else {
        debug!(
            method = %method,
            path = uri.path(),
            error_type = err.error_type(),
            "Authentication failed: {}",
            err
        );
    }
}

// =============================================================================
// Tower layer and service
// =============================================================================

/// Layer producing [`AuthGate`] services that share one validator.
#[derive(Debug, Clone)]
pub struct AuthGateLayer {
    validator: TokenValidator,
    policy: BearerPolicy,
}

impl AuthGateLayer {
    pub fn new(validator: TokenValidator) -> Self {
        Self {
            validator,
            policy: BearerPolicy::default(),
        }
    }

    /// Set the bearer scheme policy.
    pub fn with_policy(mut self, policy: BearerPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<S> Layer<S> for AuthGateLayer {
    type Service = AuthGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthGate {
            inner,
            validator: self.validator.clone(),
            policy: self.policy,
        }
    }
}

/// A service that only lets authenticated requests reach `inner`.
#[derive(Clone)]
pub struct AuthGate<S> {
    inner: S,
    validator: TokenValidator,
    policy: BearerPolicy,
}

impl<S> AuthGate<S> {
    /// Wrap `inner` so that it only sees requests carrying a valid credential.
    pub fn new(inner: S, validator: TokenValidator) -> Self {
        Self {
            inner,
            validator,
            policy: BearerPolicy::default(),
        }
    }

    /// Set the bearer scheme policy.
    pub fn with_policy(mut self, policy: BearerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> BearerPolicy {
        self.policy
    }
}

impl<S, B> Service<Request<B>> for AuthGate<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Error: Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<B>) -> Self::Future {
        match authenticate(&self.validator, self.policy, request.headers()) {
            Ok(claims) => {
                debug!(
                    method = %request.method(),
                    path = request.uri().path(),
                    subject = claims.sub.as_deref().unwrap_or("-"),
                    "Credential validated; passing request to next handler"
                );
                request.extensions_mut().insert(claims);

                // The service polled ready is the one that must handle the call
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(inner.call(request))
            }
            Err(err) => {
                record_rejection(request.method(), request.uri(), &err);
                Box::pin(async move { Ok::<_, S::Error>(err.into_response()) })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

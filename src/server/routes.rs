//! Router assembly for the gateway.
//!
//! # Layer Structure
//!
//! ```text
//! TraceLayer (optional)
//!   └─ CorsLayer (optional, answers preflight requests)
//!        └─ AuthGate
//!             └─ GatewayMux router
//!                  ├─ POST /<package>.<Interface>/{method}  → Forwarder
//!                  └─ fallback                              → 404 JSON
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cue_rest_gateway::server::routes::{create_router, RouterConfig};
//!
//! let mut mux = GatewayMux::new();
//! InterfaceRegistry::opencue().register_all(&mut mux, "cuebot:8443", &DialOptions::default())?;
//!
//! let validator = TokenValidator::from_secret("my-secret")?;
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://cueweb.example.com".to_string()]);
//!
//! let router = create_router(mux, validator, &config);
//! ```

use std::time::Duration;

use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{AuthGateLayer, BearerPolicy, TokenValidator};
use crate::gateway::GatewayMux;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = CORS disabled, "*" = any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// How the Authorization header is parsed
    pub bearer_policy: BearerPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            bearer_policy: BearerPolicy::Lenient,
        }
    }
}

impl RouterConfig {
    /// Create a configuration with CORS off, tracing on and lenient bearer parsing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set allowed CORS origins.
    ///
    /// An empty vec leaves CORS disabled.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    pub fn with_bearer_policy(mut self, policy: BearerPolicy) -> Self {
        self.bearer_policy = policy;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the gateway router: the combined handler behind the auth gate.
pub fn create_router(mux: GatewayMux, validator: TokenValidator, config: &RouterConfig) -> Router {
    let gate = AuthGateLayer::new(validator).with_policy(config.bearer_policy);
    let mut router = mux.into_router().layer(gate);

    if let Some(cors) = build_cors_layer(config) {
        router = router.layer(cors);
    }

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer, or `None` when no origins are configured.
fn build_cors_layer(config: &RouterConfig) -> Option<CorsLayer> {
    let origins = config.cors_origins.as_ref().filter(|o| !o.is_empty())?;

    let cors = CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    if origins.iter().any(|o| o == "*") {
        return Some(cors.allow_origin(Any));
    }

    let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    Some(cors.allow_origin(parsed_origins))
}

// =============================================================================
// Tests
// =============================================================================

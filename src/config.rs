//! Configuration management for the gateway.
//!
//! Every option can be given as a command-line flag or an environment
//! variable. The three deployment variables of the container image are
//! required:
//!
//! - `CUEBOT_ENDPOINT` - Backend address, `host:port` or a full URL
//! - `REST_PORT` - Port the gateway listens on
//! - `JWT_SECRET` - Shared HMAC secret used to verify credentials
//!
//! Optional:
//!
//! - `REST_HOST` - Bind address (default: 0.0.0.0)
//! - `CUEBOT_TLS` - Reach the backend over HTTPS (default: false)
//! - `CUEBOT_REQUEST_TIMEOUT` - Seconds allowed per forwarded call (default: 30)
//! - `REST_REQUIRE_BEARER` - Reject credentials without the `Bearer` scheme (default: false)
//! - `REST_CORS_ORIGINS` - Comma-separated allowed origins (default: CORS disabled)
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use cue_rest_gateway::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Forwarding to {}", config.cuebot_endpoint);
//! ```

use std::time::Duration;

use clap::Parser;

use crate::auth::BearerPolicy;
use crate::error::ConfigError;
use crate::gateway::{DialOptions, TransportSecurity, DEFAULT_CONNECT_TIMEOUT};
use crate::server::RouterConfig;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default per-call backend timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// CLI Arguments
// =============================================================================

/// cue-rest-gateway - JWT-authenticated HTTP/JSON front door for Cuebot.
///
/// Verifies a signed credential on every request, then forwards
/// `POST /<package>.<Interface>/<Method>` calls to the Cuebot backend.
#[derive(Parser, Debug, Clone)]
#[command(name = "cue-rest-gateway")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "REST_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, env = "REST_PORT")]
    pub port: u16,

    // =========================================================================
    // Backend Configuration
    // =========================================================================
    /// Cuebot backend address (e.g. `cuebot:8443`).
    #[arg(long, env = "CUEBOT_ENDPOINT")]
    pub cuebot_endpoint: String,

    /// Use HTTPS to reach the backend.
    #[arg(long, default_value_t = false, env = "CUEBOT_TLS")]
    pub cuebot_tls: bool,

    /// Seconds allowed for each forwarded call.
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS, env = "CUEBOT_REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Shared secret used to verify HMAC-signed JWT credentials.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Require the `Authorization: Bearer <token>` form.
    ///
    /// By default a bare token is also accepted.
    #[arg(long, default_value_t = false, env = "REST_REQUIRE_BEARER")]
    pub require_bearer: bool,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated, `*` for any).
    ///
    /// If not specified, CORS is disabled.
    #[arg(long, env = "REST_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cuebot_endpoint.trim().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }

        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn bearer_policy(&self) -> BearerPolicy {
        if self.require_bearer {
            BearerPolicy::Strict
        } else {
            BearerPolicy::Lenient
        }
    }

    /// Options for every backend client.
    pub fn dial_options(&self) -> DialOptions {
        let transport = if self.cuebot_tls {
            TransportSecurity::Tls
        } else {
            TransportSecurity::Insecure
        };

        DialOptions::default()
            .with_transport(transport)
            .with_request_timeout(Duration::from_secs(self.request_timeout))
            .with_connect_timeout(DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn router_config(&self) -> RouterConfig {
        let mut router_config = RouterConfig::new()
            .with_tracing(!self.no_tracing)
            .with_bearer_policy(self.bearer_policy());

        if let Some(ref origins) = self.cors_origins {
            router_config = router_config.with_cors_origins(origins.clone());
        }

        router_config
    }
}

// =============================================================================
// Tests
// =============================================================================

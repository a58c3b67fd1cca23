//! # cue-rest-gateway
//!
//! An authenticated HTTP/JSON gateway in front of the OpenCue Cuebot RPC
//! interfaces.
//!
//! Every inbound request must carry an HMAC-signed JWT in its
//! `Authorization` header. Authenticated calls of the form
//! `POST /<package>.<Interface>/<Method>` are forwarded to the Cuebot backend
//! and the backend's answer is passed back unchanged.
//!
//! ## Architecture
//!
//! - [`auth`] - Credential validation and the authentication gate
//! - [`gateway`] - Interface registry, combined handler and backend forwarding
//! - [`server`] - Router assembly, error responses and process bootstrap
//! - [`config`] - CLI and environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use cue_rest_gateway::{run, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config {
//!         host: "0.0.0.0".to_string(),
//!         port: 8448,
//!         cuebot_endpoint: "cuebot:8443".to_string(),
//!         cuebot_tls: false,
//!         request_timeout: 30,
//!         jwt_secret: "change-me".to_string(),
//!         require_bearer: false,
//!         cors_origins: None,
//!         verbose: false,
//!         no_tracing: false,
//!     };
//!
//!     // Blocks until SIGINT or SIGTERM
//!     if let Err(e) = run(config).await {
//!         eprintln!("{}", e);
//!     }
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod server;

// Re-export commonly used types
pub use auth::{
    validate_token, AuthError, AuthGate, AuthGateLayer, BearerPolicy, Claims, SigningSecret,
    TokenValidator,
};
pub use config::Config;
pub use error::{ConfigError, GatewayError, RegistrationError, TranslationError, TranslatorError};
pub use gateway::{
    register_forwarding, DialOptions, GatewayMux, InterfaceRegistry, RegistrationEntry,
    TransportSecurity, OPENCUE_INTERFACES,
};
pub use server::{build_gateway, create_router, run, run_with, ErrorResponse, RouterConfig};

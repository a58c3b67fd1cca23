use thiserror::Error;

/// Errors found while validating the process configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The backend endpoint is empty
    #[error("Backend endpoint is required. Set --cuebot-endpoint or CUEBOT_ENDPOINT")]
    MissingEndpoint,

    /// The signing secret is empty
    #[error("JWT signing secret is required. Set --jwt-secret or JWT_SECRET")]
    MissingSecret,

    /// The outbound request timeout is zero
    #[error("request timeout must be greater than 0 seconds")]
    InvalidTimeout,
}

/// Errors raised by a translator while wiring one interface into the mux.
#[derive(Debug, Clone, Error)]
pub enum TranslatorError {
    /// Interface name is not of the form `<package>.<Interface>`
    #[error("invalid interface name '{0}': expected <package>.<Interface>")]
    InvalidInterfaceName(String),

    /// Backend endpoint cannot be turned into a base URL
    #[error("invalid backend endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// HTTP client could not be built from the dial options
    #[error("failed to build backend client: {0}")]
    Client(String),
}

/// A registration entry failed; carries the identity of the failing interface.
#[derive(Debug, Clone, Error)]
#[error("failed to register {interface} (entry {position}): {source}")]
pub struct RegistrationError {
    /// Fully-qualified interface name, e.g. `job.JobInterface`
    pub interface: String,

    /// Zero-based position of the entry in the registry
    pub position: usize,

    /// Underlying translator failure
    #[source]
    pub source: TranslatorError,
}

/// Per-request failures inside the translation layer.
///
/// These are turned into JSON error bodies by the server layer.
#[derive(Debug, Clone, Error)]
pub enum TranslationError {
    /// Request body is not valid JSON (should map to HTTP 400)
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    /// No interface is registered for the path (should map to HTTP 404)
    #[error("no interface registered for {0}")]
    UnknownInterface(String),

    /// Method segment is not a plain identifier (should map to HTTP 404)
    #[error("no method '{method}' on {interface}")]
    UnknownMethod { interface: String, method: String },

    /// Path belongs to an interface but the method is not POST (should map to HTTP 405)
    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    /// Backend could not be reached (should map to HTTP 503)
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend did not answer within the request timeout (should map to HTTP 504)
    #[error("backend deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Backend answered with more than the configured body limit (should map to HTTP 502)
    #[error("backend response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// Any other transport failure talking to the backend (should map to HTTP 502)
    #[error("backend error: {0}")]
    Backend(String),
}

/// Fatal errors that stop the gateway process.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to register interface handlers: {0}")]
    Registration(#[from] RegistrationError),

    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

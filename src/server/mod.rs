//! HTTP server layer for the gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        POST /<package>.<Interface>/<Method>  (Bearer JWT)       │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  bootstrap  │  │   routes    │  │        handlers         │  │
//! │  │ (startup)   │  │ (layering)  │  │   (JSON error bodies)   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod bootstrap;
pub mod handlers;
pub mod routes;

pub use bootstrap::{build_gateway, run, run_with, serve, shutdown_signal};
pub use handlers::ErrorResponse;
pub use routes::{create_router, RouterConfig};

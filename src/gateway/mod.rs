//! Interface fan-out: the combined handler and what gets mounted on it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     InterfaceRegistry                        │
//! │   show.ShowInterface, job.JobInterface, ... (fixed order)    │
//! │                          │ register_all                      │
//! │                          ▼                                   │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │  GatewayMux  │◄──│  Forwarder   │──►│  Cuebot backend  │  │
//! │  │ (routes)     │   │ (per iface)  │   │  (HTTP/JSON)     │  │
//! │  └──────────────┘   └──────────────┘   └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod forward;
pub mod interfaces;
pub mod mux;
pub mod registry;

pub use forward::{
    register_forwarding, resolve_base_url, DialOptions, Forwarder, TransportSecurity,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_REQUEST_TIMEOUT,
};
pub use interfaces::{split_interface_name, OPENCUE_INTERFACES};
pub use mux::GatewayMux;
pub use registry::{InterfaceRegistry, RegisterFn, RegistrationEntry};

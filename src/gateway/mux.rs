//! The combined handler that every registered interface is mounted on.
//!
//! Interfaces are keyed by their fully-qualified name. Registering the same
//! interface twice replaces the earlier handler, so re-running registration on
//! a mux never produces duplicate routes.

use std::collections::BTreeMap;

use axum::routing::MethodRouter;
use axum::Router;
use http::Uri;
use tracing::debug;

use crate::error::TranslationError;

/// Interface name to handler table, turned into an axum [`Router`] at startup.
#[derive(Default)]
pub struct GatewayMux {
    routes: BTreeMap<String, MethodRouter>,
}

impl GatewayMux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `handler` for every method of `interface`.
    ///
    /// Returns `true` when an earlier handler for the same interface was replaced.
    pub fn handle(&mut self, interface: impl Into<String>, handler: MethodRouter) -> bool {
        let interface = interface.into();
        let replaced = self.routes.insert(interface.clone(), handler).is_some();
        if replaced {
            debug!(interface = %interface, "Replaced existing interface handler");
        }
        replaced
    }

    pub fn contains(&self, interface: &str) -> bool {
        self.routes.contains_key(interface)
    }

    /// Registered interface names, in sorted order.
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Build the router: `/<interface>/{method}` per entry, JSON 404 otherwise.
    pub fn into_router(self) -> Router {
        self.routes
            .into_iter()
            .fold(Router::new(), |router, (interface, handler)| {
                router.route(&format!("/{}/{{method}}", interface), handler)
            })
            .fallback(unknown_interface)
    }
}

impl std::fmt::Debug for GatewayMux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMux")
            .field("interfaces", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

async fn unknown_interface(uri: Uri) -> TranslationError {
    TranslationError::UnknownInterface(uri.path().to_string())
}

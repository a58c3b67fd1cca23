//! Ordered registration of backend interfaces onto the gateway mux.
//!
//! Registration is a sequential fold over a fixed table: each entry mounts one
//! interface, and the first failing entry stops the run. Entries that already
//! succeeded stay mounted; running the registry again on the same mux simply
//! replaces them.

use std::fmt;

use tracing::{debug, info};

use super::forward::{register_forwarding, DialOptions};
use super::interfaces::OPENCUE_INTERFACES;
use super::mux::GatewayMux;
use crate::error::{RegistrationError, TranslatorError};

/// Signature of a per-interface registration function.
pub type RegisterFn =
    dyn Fn(&mut GatewayMux, &str, &DialOptions) -> Result<(), TranslatorError> + Send + Sync;

/// One interface and the function that mounts it.
pub struct RegistrationEntry {
    name: String,
    register: Box<RegisterFn>,
}

impl RegistrationEntry {
    pub fn new<F>(name: impl Into<String>, register: F) -> Self
    where
        F: Fn(&mut GatewayMux, &str, &DialOptions) -> Result<(), TranslatorError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            register: Box::new(register),
        }
    }

    /// Entry that forwards `name` to the backend over HTTP/JSON.
    pub fn forwarding(name: impl Into<String>) -> Self {
        let name = name.into();
        let interface = name.clone();
        Self::new(name, move |mux, endpoint, options| {
            register_forwarding(mux, &interface, endpoint, options)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for RegistrationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The fixed, ordered list of interfaces the gateway exposes.
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    entries: Vec<RegistrationEntry>,
}

impl InterfaceRegistry {
    pub fn new(entries: Vec<RegistrationEntry>) -> Self {
        Self { entries }
    }

    /// All OpenCue interfaces, forwarded to the Cuebot backend.
    pub fn opencue() -> Self {
        OPENCUE_INTERFACES
            .iter()
            .map(|name| RegistrationEntry::forwarding(*name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Interface names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(RegistrationEntry::name)
    }

    /// Mount every entry on `mux`, in order, stopping at the first failure.
    pub fn register_all(
        &self,
        mux: &mut GatewayMux,
        endpoint: &str,
        options: &DialOptions,
    ) -> Result<(), RegistrationError> {
        for (position, entry) in self.entries.iter().enumerate() {
            (entry.register)(mux, endpoint, options).map_err(|source| RegistrationError {
                interface: entry.name.clone(),
                position,
                source,
            })?;
            debug!(interface = entry.name(), position, "Registered interface");
        }

        info!(
            count = self.entries.len(),
            endpoint = endpoint,
            "Registered all interfaces"
        );
        Ok(())
    }
}

impl FromIterator<RegistrationEntry> for InterfaceRegistry {
    fn from_iter<I: IntoIterator<Item = RegistrationEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

//! Process-wide named-adapter registry for hosting frameworks.
//!
//! Replaces load-time side-effecting plugin tables: the host
//! explicitly registers each constructed bridge once at startup and
//! resolves it by name thereafter (init-once, read-many).

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use tracing::warn;

use crate::bridge::RtmBridge;
use crate::AdapterError;

/// Named-adapter table.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: RwLock<HashMap<String, Arc<RtmBridge>>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bridge under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::DuplicateAdapter`] if the name is taken;
    /// the existing entry is kept.
    pub fn register(&self, name: &str, adapter: Arc<RtmBridge>) -> Result<(), AdapterError> {
        let mut map = self
            .adapters
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match map.entry(name.to_owned()) {
            Entry::Occupied(entry) => Err(AdapterError::DuplicateAdapter(entry.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(adapter);
                Ok(())
            }
        }
    }

    /// Look up a bridge by name.
    pub fn get(&self, name: &str) -> Option<Arc<RtmBridge>> {
        match self.adapters.read() {
            Ok(map) => map.get(name).cloned(),
            Err(e) => {
                warn!(error = %e, "adapter registry lock poisoned in get");
                None
            }
        }
    }

    /// Names of all registered adapters, unordered.
    pub fn names(&self) -> Vec<String> {
        match self.adapters.read() {
            Ok(map) => map.keys().cloned().collect(),
            Err(e) => {
                warn!(error = %e, "adapter registry lock poisoned in names");
                Vec::new()
            }
        }
    }
}

/// The process-wide registry instance.
pub fn global() -> &'static AdapterRegistry {
    static GLOBAL: OnceLock<AdapterRegistry> = OnceLock::new();
    GLOBAL.get_or_init(AdapterRegistry::default)
}

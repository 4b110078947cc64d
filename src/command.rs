//! Bot command abstraction and the concurrency-safe command registry.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::AdapterError;

/// Boxed error type returned by command execution.
pub type CommandError = Box<dyn std::error::Error + Send + Sync>;

/// A named bot command.
///
/// Commands are owned by their registrant; the registry holds shared
/// references keyed by name.
pub trait Command: Send + Sync {
    /// The name the command is invoked by (the first argument token).
    fn name(&self) -> &str;

    /// Execute with the full argument list; `args[0]` is the command
    /// name itself. Returns the reply body as raw bytes.
    ///
    /// # Errors
    ///
    /// An error here is relayed to the originating conversation as a
    /// formatted chat reply; it never escapes the dispatcher.
    fn exec(&self, args: &[String]) -> Result<Vec<u8>, CommandError>;
}

/// Registry mapping command names to handlers.
///
/// Registration takes exclusive access, lookups take shared access, so
/// dispatches across independent sessions proceed in parallel. A
/// lookup sees a snapshot: registrations that land after it begins are
/// not visible to it.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Arc<dyn Command>>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a command under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::DuplicateCommand`] if a command with the
    /// same name is already registered; the existing entry is kept.
    pub fn register(&self, command: Arc<dyn Command>) -> Result<(), AdapterError> {
        let name = command.name().to_owned();
        let mut map = self
            .commands
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match map.entry(name) {
            Entry::Occupied(entry) => Err(AdapterError::DuplicateCommand(entry.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(command);
                Ok(())
            }
        }
    }

    /// Look up a command by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        match self.commands.read() {
            Ok(map) => map.get(name).cloned(),
            Err(e) => {
                warn!(error = %e, "command registry lock poisoned in get");
                None
            }
        }
    }

    /// Number of registered commands.
    pub fn count(&self) -> usize {
        match self.commands.read() {
            Ok(map) => map.len(),
            Err(e) => {
                warn!(error = %e, "command registry lock poisoned in count");
                0
            }
        }
    }
}

//! Periodically refreshed map of user identifiers to display names.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::client::RtmClient;

/// Cache of user display names, rebuilt wholesale on each refresh.
///
/// The roster only personalizes replies: a stale or missing entry is
/// never an error, and a failed refresh keeps the previous names.
#[derive(Default)]
pub struct UserRoster {
    names: RwLock<HashMap<String, String>>,
}

impl UserRoster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the roster from the service's full user list.
    ///
    /// On lookup failure the existing cache is left untouched; before
    /// the first successful refresh the roster is simply empty.
    pub async fn refresh(&self, client: &dyn RtmClient) {
        let users = match client.list_users().await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "user list refresh failed, keeping cached names");
                return;
            }
        };

        let mut rebuilt = HashMap::with_capacity(users.len());
        for user in users {
            rebuilt.insert(user.id, user.name);
        }

        match self.names.write() {
            Ok(mut map) => {
                let count = rebuilt.len();
                *map = rebuilt;
                debug!(count, "user roster refreshed");
            }
            Err(e) => warn!(error = %e, "roster lock poisoned in refresh"),
        }
    }

    /// Display name for `user_id`, or the empty string when unknown.
    pub fn name_of(&self, user_id: &str) -> String {
        match self.names.read() {
            Ok(map) => map.get(user_id).cloned().unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "roster lock poisoned in name_of");
                String::new()
            }
        }
    }
}

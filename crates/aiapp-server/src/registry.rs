//! Read-only application directory
//!
//! Resolves the `appId` every relay request must carry. The catalog is
//! fixed at startup; managing it belongs to the admin backend, not to the
//! relay.

use aiapp_relay::AppProfile;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: HashMap<String, AppProfile>,
}

impl AppRegistry {
    pub fn new(profiles: Vec<AppProfile>) -> Self {
        let mut apps = HashMap::new();
        for profile in profiles {
            if apps.insert(profile.id.clone(), profile).is_some() {
                tracing::warn!("duplicate app id in configuration; keeping the last entry");
            }
        }
        Self { apps }
    }

    pub fn get(&self, id: &str) -> Option<&AppProfile> {
        self.apps.get(id)
    }

    /// All registered apps, ordered by id for stable listings.
    pub fn list(&self) -> Vec<&AppProfile> {
        let mut apps: Vec<&AppProfile> = self.apps.values().collect();
        apps.sort_by(|a, b| a.id.cmp(&b.id));
        apps
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

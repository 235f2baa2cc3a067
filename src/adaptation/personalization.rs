//! Per-user personalization profiles
//!
//! Free-form preference maps, created lazily and shallow-merged on each
//! update. Reads never fail: an unknown user simply has no preferences yet.

use crate::types::PersonalizationProfile;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

/// Registry of per-user preference profiles
pub struct PersonalizationStore {
    profiles: RwLock<HashMap<String, PersonalizationProfile>>,
}

impl PersonalizationStore {
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Merge preferences into the user's profile (shallow, last write wins)
    pub async fn merge(
        &self,
        user_id: &str,
        preferences: BTreeMap<String, Value>,
    ) -> PersonalizationProfile {
        let now = Utc::now();
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .entry(user_id.to_string())
            .or_insert_with(|| PersonalizationProfile {
                user_id: user_id.to_string(),
                preferences: BTreeMap::new(),
                last_updated: now,
            });

        debug!(user_id, keys = preferences.len(), "Merging preferences");
        profile.preferences.extend(preferences);
        profile.last_updated = now;
        profile.clone()
    }

    /// The user's preference map; empty if the user is unknown
    pub async fn preferences(&self, user_id: &str) -> BTreeMap<String, Value> {
        let profiles = self.profiles.read().await;
        profiles
            .get(user_id)
            .map(|p| p.preferences.clone())
            .unwrap_or_default()
    }

    /// All profiles for snapshot export
    pub async fn snapshot(&self) -> Vec<PersonalizationProfile> {
        let profiles = self.profiles.read().await;
        let mut all: Vec<PersonalizationProfile> = profiles.values().cloned().collect();
        all.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        all
    }

    /// Rebuild the registry from a snapshot
    pub async fn restore(&self, snapshot: Vec<PersonalizationProfile>) {
        let rebuilt = snapshot
            .into_iter()
            .map(|p| (p.user_id.clone(), p))
            .collect();
        let mut profiles = self.profiles.write().await;
        *profiles = rebuilt;
    }
}

impl Default for PersonalizationStore {
    fn default() -> Self {
        Self::new()
    }
}

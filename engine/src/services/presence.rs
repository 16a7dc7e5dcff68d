use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::StoreResult;

/// Check-in and venue metadata live in a separate system; the engine only
/// asks two questions of it.
#[async_trait]
pub trait CheckinDirectory: Send + Sync {
    /// Whether the user currently has an open check-in at the venue.
    async fn is_checked_in(&self, user_id: &str, venue_id: &str) -> StoreResult<bool>;

    /// Display name for a venue, if the directory knows one.
    async fn venue_name(&self, venue_id: &str) -> StoreResult<Option<String>>;
}

/// In-process directory for tests and the demo binary.
#[derive(Debug, Default)]
pub struct StaticRoster {
    inner: RwLock<RosterInner>,
}

#[derive(Debug, Default)]
struct RosterInner {
    checkins: HashSet<(String, String)>,
    venue_names: HashMap<String, String>,
}

impl StaticRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check_in(&self, user_id: &str, venue_id: &str) {
        let mut inner = self.inner.write().await;
        inner
            .checkins
            .insert((user_id.to_string(), venue_id.to_string()));
    }

    pub async fn check_out(&self, user_id: &str, venue_id: &str) {
        let mut inner = self.inner.write().await;
        inner
            .checkins
            .remove(&(user_id.to_string(), venue_id.to_string()));
    }

    pub async fn name_venue(&self, venue_id: &str, name: &str) {
        let mut inner = self.inner.write().await;
        inner
            .venue_names
            .insert(venue_id.to_string(), name.to_string());
    }
}

#[async_trait]
impl CheckinDirectory for StaticRoster {
    async fn is_checked_in(&self, user_id: &str, venue_id: &str) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .checkins
            .contains(&(user_id.to_string(), venue_id.to_string())))
    }

    async fn venue_name(&self, venue_id: &str) -> StoreResult<Option<String>> {
        let inner = self.inner.read().await;
        Ok(inner.venue_names.get(venue_id).cloned())
    }
}

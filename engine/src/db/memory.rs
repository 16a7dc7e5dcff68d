use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{MatchInsert, Store, StoreError, StoreResult};
use crate::models::{ChatMessage, ChatThread, Interest, LikesQuota, Match, canonical_pair};

/// On-device backend: everything lives behind one RwLock, so each write is a
/// single atomic step. Also the store the test suite runs against.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    interests: HashMap<(String, String), Interest>,
    quotas: HashMap<(String, String), LikesQuota>,
    matches: HashMap<Uuid, Match>,
    pair_index: HashMap<(String, String), Uuid>,
    threads: HashMap<Uuid, ChatThread>,
    messages: HashMap<Uuid, Vec<ChatMessage>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn pair_key(user_1: &str, user_2: &str) -> (String, String) {
    let (a, b) = canonical_pair(user_1, user_2);
    (a.to_string(), b.to_string())
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_interest(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> StoreResult<Option<Interest>> {
        let inner = self.inner.read().await;
        Ok(inner
            .interests
            .get(&(from_user_id.to_string(), to_user_id.to_string()))
            .cloned())
    }

    async fn save_interest(&self, interest: &Interest) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.interests.insert(
            (
                interest.from_user_id.clone(),
                interest.to_user_id.clone(),
            ),
            interest.clone(),
        );
        Ok(())
    }

    async fn record_like(&self, interest: &Interest, quota: &LikesQuota) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.interests.insert(
            (
                interest.from_user_id.clone(),
                interest.to_user_id.clone(),
            ),
            interest.clone(),
        );
        inner.quotas.insert(
            (quota.user_id.clone(), quota.venue_id.clone()),
            quota.clone(),
        );
        Ok(())
    }

    async fn get_quota(&self, user_id: &str, venue_id: &str) -> StoreResult<Option<LikesQuota>> {
        let inner = self.inner.read().await;
        Ok(inner
            .quotas
            .get(&(user_id.to_string(), venue_id.to_string()))
            .cloned())
    }

    async fn save_quota(&self, quota: &LikesQuota) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.quotas.insert(
            (quota.user_id.clone(), quota.venue_id.clone()),
            quota.clone(),
        );
        Ok(())
    }

    async fn interests_toward(
        &self,
        to_user_id: &str,
        venue_id: &str,
    ) -> StoreResult<Vec<Interest>> {
        let inner = self.inner.read().await;
        let mut found: Vec<Interest> = inner
            .interests
            .values()
            .filter(|i| i.active && i.to_user_id == to_user_id && i.venue_id == venue_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let inner = self.inner.read().await;
        Ok(inner.matches.get(&id).cloned())
    }

    async fn find_match_for_pair(
        &self,
        user_1: &str,
        user_2: &str,
    ) -> StoreResult<Option<Match>> {
        let inner = self.inner.read().await;
        let Some(&id) = inner.pair_index.get(&pair_key(user_1, user_2)) else {
            return Ok(None);
        };
        Ok(inner.matches.get(&id).cloned())
    }

    async fn insert_match_if_absent(&self, candidate: &Match) -> StoreResult<MatchInsert> {
        let mut inner = self.inner.write().await;
        let key = pair_key(&candidate.user_a, &candidate.user_b);
        if let Some(&existing_id) = inner.pair_index.get(&key) {
            let existing = inner.matches.get(&existing_id).cloned().ok_or_else(|| {
                StoreError::Corrupt(format!("pair index points at missing match {existing_id}"))
            })?;
            return Ok(MatchInsert::Raced(existing));
        }
        inner.pair_index.insert(key, candidate.id);
        inner.matches.insert(candidate.id, candidate.clone());
        Ok(MatchInsert::Created(candidate.clone()))
    }

    async fn update_match(&self, updated: &Match) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.matches.insert(updated.id, updated.clone());
        Ok(())
    }

    async fn matches_for_user(&self, user_id: &str) -> StoreResult<Vec<Match>> {
        let inner = self.inner.read().await;
        let mut found: Vec<Match> = inner
            .matches
            .values()
            .filter(|m| m.involves(user_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn stale_active_matches(&self, now: DateTime<Utc>) -> StoreResult<Vec<Match>> {
        let inner = self.inner.read().await;
        Ok(inner
            .matches
            .values()
            .filter(|m| m.active && now >= m.expires_at)
            .cloned()
            .collect())
    }

    async fn matches_expiring_before(
        &self,
        now: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> StoreResult<Vec<Match>> {
        let inner = self.inner.read().await;
        Ok(inner
            .matches
            .values()
            .filter(|m| now < m.expires_at && m.expires_at <= deadline)
            .cloned()
            .collect())
    }

    async fn get_thread(&self, match_id: Uuid) -> StoreResult<Option<ChatThread>> {
        let inner = self.inner.read().await;
        Ok(inner.threads.get(&match_id).cloned())
    }

    async fn insert_thread_if_absent(&self, thread: &ChatThread) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.threads.entry(thread.match_id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(thread.clone());
                Ok(true)
            }
        }
    }

    async fn messages_for_match(&self, match_id: Uuid) -> StoreResult<Vec<ChatMessage>> {
        let inner = self.inner.read().await;
        Ok(inner.messages.get(&match_id).cloned().unwrap_or_default())
    }

    async fn append_message(&self, message: &ChatMessage) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .messages
            .entry(message.match_id)
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn append_message_if_first(&self, message: &ChatMessage) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let slot = inner.messages.entry(message.match_id).or_default();
        if !slot.is_empty() {
            return Ok(false);
        }
        slot.push(message.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;

    fn sample_match(user_a: &str, user_b: &str) -> Match {
        let now = Utc::now();
        Match {
            id: Uuid::new_v4(),
            user_a: user_a.to_string(),
            user_b: user_b.to_string(),
            venue_id: "v1".to_string(),
            venue_name: "Velvet Room".to_string(),
            created_at: now,
            expires_at: now + Duration::hours(24),
            active: true,
            contact_shared: false,
            reconnect_requested_a: None,
            reconnect_requested_b: None,
            reconnected_at: None,
            met: false,
        }
    }

    #[tokio::test]
    async fn pair_lookup_is_order_independent() {
        let store = MemoryStore::new();
        let m = sample_match("alice", "bob");
        store.insert_match_if_absent(&m).await.unwrap();

        let forward = store.find_match_for_pair("alice", "bob").await.unwrap();
        let backward = store.find_match_for_pair("bob", "alice").await.unwrap();
        assert_eq!(forward.unwrap().id, m.id);
        assert_eq!(backward.unwrap().id, m.id);
    }

    #[tokio::test]
    async fn concurrent_inserts_keep_one_match_per_pair() {
        let store = Arc::new(MemoryStore::new());
        let first = sample_match("alice", "bob");
        let second = sample_match("alice", "bob");

        let (r1, r2) = tokio::join!(
            store.insert_match_if_absent(&first),
            store.insert_match_if_absent(&second),
        );
        let outcomes = [r1.unwrap(), r2.unwrap()];
        let created = outcomes
            .iter()
            .filter(|o| matches!(o, MatchInsert::Created(_)))
            .count();
        assert_eq!(created, 1);

        let survivor = store
            .find_match_for_pair("bob", "alice")
            .await
            .unwrap()
            .unwrap();
        for outcome in outcomes {
            assert_eq!(outcome.into_match().id, survivor.id);
        }
    }

    #[tokio::test]
    async fn seed_append_lands_only_on_empty_thread() {
        let store = MemoryStore::new();
        let match_id = Uuid::new_v4();
        let seed = ChatMessage {
            id: Uuid::new_v4(),
            match_id,
            sender_id: None,
            text: "hello".to_string(),
            sent_at: Utc::now(),
        };
        assert!(store.append_message_if_first(&seed).await.unwrap());
        assert!(!store.append_message_if_first(&seed).await.unwrap());
        assert_eq!(store.messages_for_match(match_id).await.unwrap().len(), 1);
    }
}

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{MatchInsert, Store};
use crate::error::{EngineError, EngineResult};
use crate::models::{Match, canonical_pair};
use crate::services::chat::ChatService;
use crate::services::expiry;
use crate::services::notify::Notifier;
use crate::utils::Config;

/// Owns Match records: promotes mutual interest into a match, answers
/// active-match queries, and carries the per-match bookkeeping.
#[derive(Clone)]
pub struct MatchService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    chat: ChatService,
    config: Config,
}

/// What a mutual-like detection produced.
#[derive(Debug, Clone)]
pub enum MutualOutcome {
    Created(Match),
    AlreadyActive(Match),
    /// The pair's previous window closed and neither a reconnect happened
    /// nor is one forced here: expired matches only come back through the
    /// two-sided reconnect flow.
    ExpiredPending(Match),
}

impl MatchService {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        chat: ChatService,
        config: Config,
    ) -> Self {
        Self {
            store,
            notifier,
            chat,
            config,
        }
    }

    pub async fn on_mutual_detected(
        &self,
        user_1: &str,
        user_2: &str,
        venue_id: &str,
        venue_name: &str,
    ) -> EngineResult<MutualOutcome> {
        let now = Utc::now();
        let (user_a, user_b) = canonical_pair(user_1, user_2);

        if let Some(existing) = self.store.find_match_for_pair(user_a, user_b).await? {
            if expiry::is_expired(&existing, now) {
                return Ok(MutualOutcome::ExpiredPending(existing));
            }
            return Ok(MutualOutcome::AlreadyActive(existing));
        }

        let candidate = Match {
            id: Uuid::new_v4(),
            user_a: user_a.to_string(),
            user_b: user_b.to_string(),
            venue_id: venue_id.to_string(),
            venue_name: venue_name.to_string(),
            created_at: now,
            expires_at: now + self.config.match_window(),
            active: true,
            contact_shared: false,
            reconnect_requested_a: None,
            reconnect_requested_b: None,
            reconnected_at: None,
            met: false,
        };

        match self.store.insert_match_if_absent(&candidate).await? {
            MatchInsert::Created(created) => {
                info!(
                    "🎉 matched {} and {} at {} (window closes {})",
                    created.user_a, created.user_b, created.venue_id, created.expires_at
                );
                self.chat.ensure_thread(created.id, None).await?;
                if let Err(e) = self.notifier.match_opened(&created).await {
                    warn!("match notification for {} failed: {e:#}", created.id);
                }
                Ok(MutualOutcome::Created(created))
            }
            MatchInsert::Raced(existing) => {
                // The other side's like landed first; same outcome either way.
                if expiry::is_expired(&existing, now) {
                    Ok(MutualOutcome::ExpiredPending(existing))
                } else {
                    Ok(MutualOutcome::AlreadyActive(existing))
                }
            }
        }
    }

    pub async fn find_for_pair(&self, user_1: &str, user_2: &str) -> EngineResult<Option<Match>> {
        Ok(self.store.find_match_for_pair(user_1, user_2).await?)
    }

    /// Matches whose window is still open. `expires_at` is authoritative;
    /// the stored `active` flag is only a cache and is not consulted.
    pub async fn get_active_matches(&self, user_id: &str) -> EngineResult<Vec<Match>> {
        let now = Utc::now();
        let mut all = self.store.matches_for_user(user_id).await?;
        all.retain(|m| !expiry::is_expired(m, now));
        Ok(all)
    }

    pub async fn mark_as_met(&self, match_id: Uuid) -> EngineResult<Match> {
        let mut m = self.require_match(match_id).await?;
        if !m.met {
            m.met = true;
            self.store.update_match(&m).await?;
        }
        Ok(m)
    }

    pub async fn share_contact(&self, match_id: Uuid, user_id: &str) -> EngineResult<Match> {
        let mut m = self.require_match(match_id).await?;
        if !m.involves(user_id) {
            return Err(EngineError::Unauthorized {
                user_id: user_id.to_string(),
                match_id,
            });
        }
        if !m.contact_shared {
            m.contact_shared = true;
            self.store.update_match(&m).await?;
        }
        Ok(m)
    }

    pub(crate) async fn require_match(&self, match_id: Uuid) -> EngineResult<Match> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or(EngineError::MatchNotFound(match_id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::notify::NoopNotifier;

    fn service() -> (MatchService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(NoopNotifier);
        let chat = ChatService::new(store.clone(), notifier.clone());
        let service = MatchService::new(store.clone(), notifier, chat, Config::default());
        (service, store)
    }

    #[tokio::test]
    async fn creation_is_idempotent_across_call_orders() {
        let (service, _store) = service();

        let first = service
            .on_mutual_detected("bob", "alice", "v1", "Velvet Room")
            .await
            .unwrap();
        let MutualOutcome::Created(created) = first else {
            panic!("expected a fresh match");
        };
        assert_eq!(created.user_a, "alice");
        assert_eq!(created.user_b, "bob");

        let second = service
            .on_mutual_detected("alice", "bob", "v1", "Velvet Room")
            .await
            .unwrap();
        let MutualOutcome::AlreadyActive(existing) = second else {
            panic!("expected the existing match back");
        };
        assert_eq!(existing.id, created.id);
    }

    #[tokio::test]
    async fn creation_seeds_the_chat_thread() {
        let (service, store) = service();

        let outcome = service
            .on_mutual_detected("alice", "bob", "v1", "Velvet Room")
            .await
            .unwrap();
        let MutualOutcome::Created(created) = outcome else {
            panic!("expected a fresh match");
        };

        let thread = store.get_thread(created.id).await.unwrap();
        assert!(thread.is_some());
        let messages = store.messages_for_match(created.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_system());
    }

    #[tokio::test]
    async fn expired_match_routes_to_reconnect_instead_of_reviving() {
        let (service, store) = service();

        let MutualOutcome::Created(mut created) = service
            .on_mutual_detected("alice", "bob", "v1", "Velvet Room")
            .await
            .unwrap()
        else {
            panic!("expected a fresh match");
        };

        created.expires_at = Utc::now() - Duration::seconds(1);
        store.update_match(&created).await.unwrap();

        let outcome = service
            .on_mutual_detected("bob", "alice", "v1", "Velvet Room")
            .await
            .unwrap();
        let MutualOutcome::ExpiredPending(expired) = outcome else {
            panic!("expired match must not be silently revived");
        };
        assert_eq!(expired.id, created.id);
        assert!(expiry::is_expired(&expired, Utc::now()));
    }

    #[tokio::test]
    async fn expired_matches_drop_out_of_active_queries() {
        let (service, store) = service();

        let MutualOutcome::Created(mut created) = service
            .on_mutual_detected("alice", "bob", "v1", "Velvet Room")
            .await
            .unwrap()
        else {
            panic!("expected a fresh match");
        };
        assert_eq!(service.get_active_matches("alice").await.unwrap().len(), 1);

        // The stale `active` flag must not resurrect an expired match.
        created.expires_at = Utc::now();
        created.active = true;
        store.update_match(&created).await.unwrap();
        assert!(service.get_active_matches("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn share_contact_is_party_only() {
        let (service, _store) = service();

        let MutualOutcome::Created(created) = service
            .on_mutual_detected("alice", "bob", "v1", "Velvet Room")
            .await
            .unwrap()
        else {
            panic!("expected a fresh match");
        };

        let err = service
            .share_contact(created.id, "mallory")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized { .. }));

        let updated = service.share_contact(created.id, "alice").await.unwrap();
        assert!(updated.contact_shared);
    }

    #[tokio::test]
    async fn mark_as_met_sets_the_flag_and_nothing_else() {
        let (service, _store) = service();

        let MutualOutcome::Created(created) = service
            .on_mutual_detected("alice", "bob", "v1", "Velvet Room")
            .await
            .unwrap()
        else {
            panic!("expected a fresh match");
        };

        let updated = service.mark_as_met(created.id).await.unwrap();
        assert!(updated.met);
        assert_eq!(updated.expires_at, created.expires_at);

        let err = service.mark_as_met(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, EngineError::MatchNotFound(_)));
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::db::Store;
use crate::error::{EngineError, EngineResult};
use crate::models::{Interest, LikesQuota, Match};
use crate::services::expiry;
use crate::services::matches::{MatchService, MutualOutcome};
use crate::services::presence::CheckinDirectory;
use crate::utils::Config;

/// Records directed likes and guards the per-venue quota. The quota
/// decrement and the interest activation land in one storage step; a like
/// is either fully recorded or not at all.
#[derive(Clone)]
pub struct LikeService {
    store: Arc<dyn Store>,
    directory: Arc<dyn CheckinDirectory>,
    matches: MatchService,
    config: Config,
}

/// Result of a like: either nothing mutual happened yet, or the pair's
/// match state in its current form.
#[derive(Debug, Clone)]
pub enum LikeOutcome {
    Recorded { remaining: i32 },
    Matched(Match),
    AlreadyMatched(Match),
    /// The pair matched before and that window closed; only mutual
    /// reconnect consent opens a new one.
    ReconnectRequired(Match),
}

impl LikeService {
    pub fn new(
        store: Arc<dyn Store>,
        directory: Arc<dyn CheckinDirectory>,
        matches: MatchService,
        config: Config,
    ) -> Self {
        Self {
            store,
            directory,
            matches,
            config,
        }
    }

    pub async fn record_like(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        venue_id: &str,
    ) -> EngineResult<LikeOutcome> {
        let now = Utc::now();

        if !self.directory.is_checked_in(from_user_id, venue_id).await? {
            return Err(EngineError::NotCheckedIn {
                user_id: from_user_id.to_string(),
                venue_id: venue_id.to_string(),
            });
        }

        // Re-liking an already-live target consumes nothing and reports the
        // pair's current state.
        if let Some(existing) = self.store.get_interest(from_user_id, to_user_id).await? {
            if existing.is_live(now) {
                return self
                    .resolve_existing(from_user_id, to_user_id, venue_id, now)
                    .await;
            }
        }

        let mut quota = match self.store.get_quota(from_user_id, venue_id).await? {
            Some(q) => q,
            None => LikesQuota {
                user_id: from_user_id.to_string(),
                venue_id: venue_id.to_string(),
                remaining: self.config.likes_per_venue,
                updated_at: now,
            },
        };
        if quota.remaining <= 0 {
            return Err(EngineError::QuotaExceeded {
                user_id: from_user_id.to_string(),
                venue_id: venue_id.to_string(),
            });
        }
        quota.remaining -= 1;
        quota.updated_at = now;

        let interest = Interest {
            from_user_id: from_user_id.to_string(),
            to_user_id: to_user_id.to_string(),
            venue_id: venue_id.to_string(),
            created_at: now,
            expires_at: now + self.config.match_window(),
            active: true,
        };
        self.store.record_like(&interest, &quota).await?;
        info!(
            "👍 {} liked {} at {} ({} likes left)",
            from_user_id, to_user_id, venue_id, quota.remaining
        );

        let reciprocal = self.reciprocal_live(from_user_id, to_user_id, now).await?;
        if !self.config.match_decision.is_mutual(reciprocal) {
            return Ok(LikeOutcome::Recorded {
                remaining: quota.remaining,
            });
        }

        let venue_name = self.venue_display_name(venue_id).await;
        match self
            .matches
            .on_mutual_detected(from_user_id, to_user_id, venue_id, &venue_name)
            .await?
        {
            MutualOutcome::Created(m) => Ok(LikeOutcome::Matched(m)),
            MutualOutcome::AlreadyActive(m) => Ok(LikeOutcome::AlreadyMatched(m)),
            MutualOutcome::ExpiredPending(m) => Ok(LikeOutcome::ReconnectRequired(m)),
        }
    }

    /// Deactivates the like. The spent quota stays spent: likes are consumed
    /// on the attempt, not on the outcome.
    pub async fn undo_like(&self, from_user_id: &str, to_user_id: &str) -> EngineResult<()> {
        let Some(mut interest) = self.store.get_interest(from_user_id, to_user_id).await? else {
            return Err(EngineError::InterestNotFound {
                from_user_id: from_user_id.to_string(),
                to_user_id: to_user_id.to_string(),
            });
        };
        if interest.active {
            interest.active = false;
            self.store.save_interest(&interest).await?;
            info!("↩️ {} withdrew their like for {}", from_user_id, to_user_id);
        }
        Ok(())
    }

    pub async fn is_mutual(&self, user_1: &str, user_2: &str) -> EngineResult<bool> {
        let now = Utc::now();
        let forward = self.store.get_interest(user_1, user_2).await?;
        let backward = self.store.get_interest(user_2, user_1).await?;
        Ok(forward.is_some_and(|i| i.is_live(now)) && backward.is_some_and(|i| i.is_live(now)))
    }

    /// Live likes pointed at a user at a venue.
    pub async fn likers_of(&self, user_id: &str, venue_id: &str) -> EngineResult<Vec<Interest>> {
        let now = Utc::now();
        let mut likes = self.store.interests_toward(user_id, venue_id).await?;
        likes.retain(|i| i.is_live(now));
        Ok(likes)
    }

    /// Restores the full per-venue allowance. Called when the user checks in
    /// again after a checkout, or from admin/demo tooling.
    pub async fn reset_quota(&self, user_id: &str, venue_id: &str) -> EngineResult<LikesQuota> {
        let quota = LikesQuota {
            user_id: user_id.to_string(),
            venue_id: venue_id.to_string(),
            remaining: self.config.likes_per_venue,
            updated_at: Utc::now(),
        };
        self.store.save_quota(&quota).await?;
        Ok(quota)
    }

    async fn resolve_existing(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        venue_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<LikeOutcome> {
        if let Some(m) = self.matches.find_for_pair(from_user_id, to_user_id).await? {
            if expiry::is_expired(&m, now) {
                return Ok(LikeOutcome::ReconnectRequired(m));
            }
            return Ok(LikeOutcome::AlreadyMatched(m));
        }

        // Both likes live but no match on record (a crash between the like
        // and the promotion, or a demo roll that came up empty): heal it.
        if self.reciprocal_live(from_user_id, to_user_id, now).await? {
            let venue_name = self.venue_display_name(venue_id).await;
            return match self
                .matches
                .on_mutual_detected(from_user_id, to_user_id, venue_id, &venue_name)
                .await?
            {
                MutualOutcome::Created(m) => Ok(LikeOutcome::Matched(m)),
                MutualOutcome::AlreadyActive(m) => Ok(LikeOutcome::AlreadyMatched(m)),
                MutualOutcome::ExpiredPending(m) => Ok(LikeOutcome::ReconnectRequired(m)),
            };
        }

        let remaining = self
            .store
            .get_quota(from_user_id, venue_id)
            .await?
            .map(|q| q.remaining)
            .unwrap_or(self.config.likes_per_venue);
        Ok(LikeOutcome::Recorded { remaining })
    }

    async fn reciprocal_live(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let reciprocal = self.store.get_interest(to_user_id, from_user_id).await?;
        Ok(reciprocal.is_some_and(|i| i.is_live(now)))
    }

    async fn venue_display_name(&self, venue_id: &str) -> String {
        match self.directory.venue_name(venue_id).await {
            Ok(Some(name)) => name,
            Ok(None) => venue_id.to_string(),
            Err(e) => {
                warn!("venue name lookup failed for {venue_id}: {e}");
                venue_id.to_string()
            }
        }
    }
}

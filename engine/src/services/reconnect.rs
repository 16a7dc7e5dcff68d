use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Store;
use crate::error::{EngineError, EngineResult};
use crate::models::Match;
use crate::services::notify::Notifier;
use crate::utils::Config;

/// Two-sided consent flow that revives an expired match. Each side's request
/// is a timestamped flag on the match; the second flag triggers the revival:
/// a fresh window, both flags consumed, `reconnected_at` stamped. After a
/// revival the next request starts a brand-new consent cycle.
#[derive(Clone)]
pub struct ReconnectService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    config: Config,
}

impl ReconnectService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub async fn request_reconnect(&self, match_id: Uuid, user_id: &str) -> EngineResult<Match> {
        let now = Utc::now();
        let Some(mut m) = self.store.get_match(match_id).await? else {
            return Err(EngineError::MatchNotFound(match_id));
        };
        if !m.involves(user_id) {
            return Err(EngineError::Unauthorized {
                user_id: user_id.to_string(),
                match_id,
            });
        }

        let first_request = m.reconnect_flag(user_id).is_none();
        if first_request {
            m.set_reconnect_flag(user_id, now);
        }

        let peer_flag = if m.user_a == user_id {
            m.reconnect_requested_b
        } else {
            m.reconnect_requested_a
        };

        if peer_flag.is_some() {
            // Both sides consented: open a fresh window and consume the pair
            // of flags so the next request starts over.
            m.active = true;
            m.expires_at = now + self.config.match_window();
            m.reconnect_requested_a = None;
            m.reconnect_requested_b = None;
            m.reconnected_at = Some(now);
            self.store.update_match(&m).await?;
            info!(
                "🔥 match {} revived for {} and {} (window closes {})",
                m.id, m.user_a, m.user_b, m.expires_at
            );
            if let Err(e) = self.notifier.match_opened(&m).await {
                warn!("revival notification for {} failed: {e:#}", m.id);
            }
        } else if first_request {
            self.store.update_match(&m).await?;
            if let Err(e) = self.notifier.reconnect_requested(&m, user_id).await {
                warn!("reconnect-request notification for {} failed: {e:#}", m.id);
            }
        }
        // A repeated request from the same side changes nothing.

        Ok(m)
    }
}

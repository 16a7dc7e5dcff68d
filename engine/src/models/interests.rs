use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A directed like: `from_user_id` expressed interest in `to_user_id` while
/// checked in at `venue_id`. There is at most one active interest per
/// (from, to) pair; liking the same person again is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub venue_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
}

impl Interest {
    /// Active and not yet past its window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && now < self.expires_at
    }
}

/// Remaining likes for one user at one venue. Created lazily on the first
/// like attempt; only an explicit reset (fresh check-in, admin tooling)
/// restores it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LikesQuota {
    pub user_id: String,
    pub venue_id: String,
    pub remaining: i32,
    pub updated_at: DateTime<Utc>,
}

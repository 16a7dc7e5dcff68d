pub mod connection;
pub mod memory;
pub mod migrations;
pub mod postgres;

pub use connection::{DatabaseConfig, get_db_pool};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChatMessage, ChatThread, Interest, LikesQuota, Match};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage operation timed out: {0}")]
    Timeout(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcome of the create-if-absent match insert. Losing the race to a
/// concurrent writer is success-with-existing-record, never an error.
#[derive(Debug, Clone)]
pub enum MatchInsert {
    Created(Match),
    Raced(Match),
}

impl MatchInsert {
    pub fn into_match(self) -> Match {
        match self {
            MatchInsert::Created(m) | MatchInsert::Raced(m) => m,
        }
    }
}

/// Persistence port for the engine's three collections plus chat. Backends
/// may be on-device (`MemoryStore`) or networked (`PgStore`); every call
/// resolves to a definite success or failure.
///
/// Two operations carry atomicity contracts the services rely on:
/// `record_like` applies an interest activation and its quota decrement
/// together or not at all, and `insert_match_if_absent` is an atomic
/// check-then-act keyed by the canonical user pair.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_interest(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> StoreResult<Option<Interest>>;

    async fn save_interest(&self, interest: &Interest) -> StoreResult<()>;

    /// Persist a fresh like and the spent quota in one atomic step.
    async fn record_like(&self, interest: &Interest, quota: &LikesQuota) -> StoreResult<()>;

    async fn get_quota(&self, user_id: &str, venue_id: &str) -> StoreResult<Option<LikesQuota>>;

    async fn save_quota(&self, quota: &LikesQuota) -> StoreResult<()>;

    /// Active interests pointed at a user at a venue (who-likes-whom lookup).
    async fn interests_toward(
        &self,
        to_user_id: &str,
        venue_id: &str,
    ) -> StoreResult<Vec<Interest>>;

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>>;

    /// Lookup by canonical pair. Callers pass the pair in either order.
    async fn find_match_for_pair(&self, user_1: &str, user_2: &str)
    -> StoreResult<Option<Match>>;

    /// Create the match unless the pair already has one. Exactly one record
    /// survives two near-simultaneous calls for the same pair.
    async fn insert_match_if_absent(&self, candidate: &Match) -> StoreResult<MatchInsert>;

    async fn update_match(&self, updated: &Match) -> StoreResult<()>;

    async fn matches_for_user(&self, user_id: &str) -> StoreResult<Vec<Match>>;

    /// Matches still flagged active whose window has already closed.
    async fn stale_active_matches(&self, now: DateTime<Utc>) -> StoreResult<Vec<Match>>;

    /// Live matches whose window closes by `deadline`.
    async fn matches_expiring_before(
        &self,
        now: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> StoreResult<Vec<Match>>;

    async fn get_thread(&self, match_id: Uuid) -> StoreResult<Option<ChatThread>>;

    /// Returns true when this call created the thread.
    async fn insert_thread_if_absent(&self, thread: &ChatThread) -> StoreResult<bool>;

    async fn messages_for_match(&self, match_id: Uuid) -> StoreResult<Vec<ChatMessage>>;

    async fn append_message(&self, message: &ChatMessage) -> StoreResult<()>;

    /// Append only if the thread has no messages yet; returns true when the
    /// message landed. Backs the one-seed-message guarantee.
    async fn append_message_if_first(&self, message: &ChatMessage) -> StoreResult<bool>;
}

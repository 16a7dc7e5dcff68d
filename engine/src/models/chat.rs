use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Conversation container, one per match. The match id is a lookup key only;
/// thread retention outlives match expiry and is decided outside this engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatThread {
    pub match_id: Uuid,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single message. `sender_id = None` marks a system message (the seeded
/// opener); content validation is not this engine's concern.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Option<String>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn is_system(&self) -> bool {
        self.sender_id.is_none()
    }
}

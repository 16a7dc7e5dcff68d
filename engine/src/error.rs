use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;

/// Typed outcomes for every engine operation. Nothing is silently swallowed;
/// only notification dispatch (a side effect, not state) is logged-and-dropped.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("user {user_id} is not checked in at venue {venue_id}")]
    NotCheckedIn { user_id: String, venue_id: String },

    #[error("user {user_id} has no likes remaining at venue {venue_id}")]
    QuotaExceeded { user_id: String, venue_id: String },

    #[error("user {user_id} is not a participant in match {match_id}")]
    Unauthorized { user_id: String, match_id: Uuid },

    #[error("match {0} not found")]
    MatchNotFound(Uuid),

    #[error("no like from {from_user_id} to {to_user_id} on record")]
    InterestNotFound {
        from_user_id: String,
        to_user_id: String,
    },

    #[error("chat thread for match {0} not found")]
    ThreadNotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// What the app shows the user. Quota and check-in problems get an
    /// actionable line; storage problems stay generic so backend detail
    /// never reaches the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineError::NotCheckedIn { .. } => "Check in at this venue to start liking people.",
            EngineError::QuotaExceeded { .. } => {
                "You're out of likes here. They come back next time you check in."
            }
            EngineError::Unauthorized { .. } => "Only the two people in a match can do that.",
            EngineError::MatchNotFound(_) | EngineError::ThreadNotFound(_) => {
                "That match isn't available anymore."
            }
            EngineError::InterestNotFound { .. } => "You haven't liked that person.",
            EngineError::Storage(_) => "Something went wrong on our end. Please try again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_message_stays_generic() {
        let err = EngineError::Storage(StoreError::Unavailable(
            "connection refused (postgres://10.0.0.3:5432)".to_string(),
        ));
        let msg = err.user_message();
        assert!(!msg.contains("postgres"));
        assert!(!msg.contains("10.0.0.3"));
    }

    #[test]
    fn quota_message_is_actionable() {
        let err = EngineError::QuotaExceeded {
            user_id: "u1".to_string(),
            venue_id: "v1".to_string(),
        };
        assert!(err.user_message().contains("likes"));
    }
}

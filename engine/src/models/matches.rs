use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A mutual, time-boxed connection between two users.
///
/// The pair is stored in canonical order (`user_a < user_b`) so both call
/// orders address the same record. `expires_at` is the authoritative
/// liveness signal; `active` is a cached flag that maintenance flushes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Match {
    pub id: Uuid,
    pub user_a: String,
    pub user_b: String,
    pub venue_id: String,
    pub venue_name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
    pub contact_shared: bool,
    pub reconnect_requested_a: Option<DateTime<Utc>>,
    pub reconnect_requested_b: Option<DateTime<Utc>>,
    pub reconnected_at: Option<DateTime<Utc>>,
    pub met: bool,
}

/// Orders a user pair so (x, y) and (y, x) map to the same lookup key.
pub fn canonical_pair<'a>(user_1: &'a str, user_2: &'a str) -> (&'a str, &'a str) {
    if user_1 <= user_2 {
        (user_1, user_2)
    } else {
        (user_2, user_1)
    }
}

impl Match {
    pub fn involves(&self, user_id: &str) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }

    pub fn peer_of(&self, user_id: &str) -> Option<&str> {
        if self.user_a == user_id {
            Some(&self.user_b)
        } else if self.user_b == user_id {
            Some(&self.user_a)
        } else {
            None
        }
    }

    /// This side's reconnect request, if one is pending.
    pub fn reconnect_flag(&self, user_id: &str) -> Option<DateTime<Utc>> {
        if self.user_a == user_id {
            self.reconnect_requested_a
        } else if self.user_b == user_id {
            self.reconnect_requested_b
        } else {
            None
        }
    }

    pub fn set_reconnect_flag(&mut self, user_id: &str, at: DateTime<Utc>) {
        if self.user_a == user_id {
            self.reconnect_requested_a = Some(at);
        } else if self.user_b == user_id {
            self.reconnect_requested_b = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_order_independent() {
        assert_eq!(canonical_pair("bob", "alice"), ("alice", "bob"));
        assert_eq!(canonical_pair("alice", "bob"), ("alice", "bob"));
    }

    #[test]
    fn canonical_pair_keeps_equal_ids_stable() {
        assert_eq!(canonical_pair("alice", "alice"), ("alice", "alice"));
    }
}

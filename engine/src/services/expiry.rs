use chrono::{DateTime, Duration, Utc};

use crate::models::Match;

// Pure window policy. `expires_at` is the single source of truth; callers
// pass `now` in, so nothing here reads the clock or mutates state.

/// Seconds left before the window closes. Never negative.
pub fn remaining_seconds(m: &Match, now: DateTime<Utc>) -> i64 {
    (m.expires_at - now).num_seconds().max(0)
}

/// The boundary is inclusive: a window that closes exactly now is closed.
pub fn is_expired(m: &Match, now: DateTime<Utc>) -> bool {
    now >= m.expires_at
}

/// Still open, but closing within `threshold`.
pub fn is_expiring_soon(m: &Match, now: DateTime<Utc>, threshold: Duration) -> bool {
    !is_expired(m, now) && m.expires_at - now <= threshold
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn match_expiring_at(expires_at: DateTime<Utc>) -> Match {
        Match {
            id: Uuid::new_v4(),
            user_a: "alice".to_string(),
            user_b: "bob".to_string(),
            venue_id: "v1".to_string(),
            venue_name: "Velvet Room".to_string(),
            created_at: expires_at - Duration::hours(24),
            expires_at,
            active: true,
            contact_shared: false,
            reconnect_requested_a: None,
            reconnect_requested_b: None,
            reconnected_at: None,
            met: false,
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        assert!(is_expired(&match_expiring_at(now), now));
        assert!(!is_expired(&match_expiring_at(now + Duration::milliseconds(1)), now));
        assert!(is_expired(&match_expiring_at(now - Duration::milliseconds(1)), now));
    }

    #[test]
    fn remaining_seconds_never_goes_negative() {
        let now = Utc::now();
        assert_eq!(remaining_seconds(&match_expiring_at(now - Duration::hours(2)), now), 0);
        assert_eq!(remaining_seconds(&match_expiring_at(now + Duration::seconds(90)), now), 90);
    }

    #[test]
    fn expiring_soon_needs_an_open_window_inside_the_threshold() {
        let now = Utc::now();
        let threshold = Duration::minutes(30);
        assert!(is_expiring_soon(&match_expiring_at(now + Duration::minutes(10)), now, threshold));
        assert!(!is_expiring_soon(&match_expiring_at(now + Duration::hours(2)), now, threshold));
        // Already closed is expired, not expiring.
        assert!(!is_expiring_soon(&match_expiring_at(now - Duration::minutes(1)), now, threshold));
    }
}

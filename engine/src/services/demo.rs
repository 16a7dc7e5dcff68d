use chrono::Utc;
use tracing::info;

use crate::constants::{DEMO_CAST, DEMO_SEED_LIKES};
use crate::db::Store;
use crate::error::EngineResult;
use crate::models::{Interest, LikesQuota};
use crate::utils::Config;

/// Seeds a demo venue: the fake cast gets quotas, and the first few members
/// already like the demo user so a like back lands a match immediately.
///
/// Idempotence comes from persisted state, not an in-memory flag: if any
/// cast likes toward the demo user are already on record, this is a no-op.
/// Returns true when seeding actually ran.
pub async fn seed_demo_data(
    store: &dyn Store,
    config: &Config,
    venue_id: &str,
    demo_user: &str,
) -> EngineResult<bool> {
    let already_seeded = store
        .interests_toward(demo_user, venue_id)
        .await?
        .iter()
        .any(|i| DEMO_CAST.contains(&i.from_user_id.as_str()));
    if already_seeded {
        return Ok(false);
    }

    let now = Utc::now();
    for (idx, cast_member) in DEMO_CAST.iter().enumerate() {
        let likes_demo_user = idx < DEMO_SEED_LIKES;
        let quota = LikesQuota {
            user_id: cast_member.to_string(),
            venue_id: venue_id.to_string(),
            remaining: if likes_demo_user {
                config.likes_per_venue - 1
            } else {
                config.likes_per_venue
            },
            updated_at: now,
        };

        if likes_demo_user {
            let interest = Interest {
                from_user_id: cast_member.to_string(),
                to_user_id: demo_user.to_string(),
                venue_id: venue_id.to_string(),
                created_at: now,
                expires_at: now + config.match_window(),
                active: true,
            };
            store.record_like(&interest, &quota).await?;
        } else {
            store.save_quota(&quota).await?;
        }
    }

    store
        .save_quota(&LikesQuota {
            user_id: demo_user.to_string(),
            venue_id: venue_id.to_string(),
            remaining: config.likes_per_venue,
            updated_at: now,
        })
        .await?;

    info!(
        "🌱 seeded demo venue {} with {} cast members ({} already like {})",
        venue_id,
        DEMO_CAST.len(),
        DEMO_SEED_LIKES,
        demo_user
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn seeding_is_idempotent_across_calls() {
        let store = MemoryStore::new();
        let config = Config::default();

        assert!(seed_demo_data(&store, &config, "v1", "demo-user").await.unwrap());
        assert!(!seed_demo_data(&store, &config, "v1", "demo-user").await.unwrap());

        let likers = store.interests_toward("demo-user", "v1").await.unwrap();
        assert_eq!(likers.len(), DEMO_SEED_LIKES);
    }

    #[tokio::test]
    async fn seed_likers_have_spent_one_like() {
        let store = MemoryStore::new();
        let config = Config::default();
        seed_demo_data(&store, &config, "v1", "demo-user").await.unwrap();

        let liker = &DEMO_CAST[0];
        let quota = store.get_quota(liker, "v1").await.unwrap().unwrap();
        assert_eq!(quota.remaining, config.likes_per_venue - 1);
    }
}

use std::sync::Arc;

use chrono::{Duration, Utc};
use sparq::db::{MemoryStore, Store};
use sparq::services::{Engine, LikeOutcome, NoopNotifier, StaticRoster, expiry};
use sparq::utils::Config;

async fn engine_at_venue(venue_id: &str, users: &[&str]) -> (Engine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let roster = Arc::new(StaticRoster::new());
    roster.name_venue(venue_id, "The Velvet Room").await;
    for user in users {
        roster.check_in(user, venue_id).await;
    }
    let engine = Engine::new(
        store.clone(),
        roster,
        Arc::new(NoopNotifier),
        Config::default(),
    );
    (engine, store)
}

#[tokio::test]
async fn full_lifecycle_from_like_to_reconnect() {
    let (engine, store) = engine_at_venue("v1", &["alice", "bob"]).await;
    let config = Config::default();

    // Alice likes Bob: quota spent, nothing mutual yet.
    let outcome = engine.record_like("alice", "bob", "v1").await.unwrap();
    let LikeOutcome::Recorded { remaining } = outcome else {
        panic!("bob hasn't liked alice yet");
    };
    assert_eq!(remaining, config.likes_per_venue - 1);
    assert!(engine.get_active_matches("alice").await.unwrap().is_empty());

    // Bob likes Alice back: exactly one match with a full window.
    let outcome = engine.record_like("bob", "alice", "v1").await.unwrap();
    let LikeOutcome::Matched(matched) = outcome else {
        panic!("reciprocal like must create the match");
    };
    let now = Utc::now();
    let window = matched.expires_at - matched.created_at;
    assert_eq!(window, config.match_window());
    assert!(!expiry::is_expired(&matched, now));
    assert_eq!(matched.venue_name, "The Velvet Room");

    for user in ["alice", "bob"] {
        let active = engine.get_active_matches(user).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, matched.id);
    }

    // Exactly one thread with exactly one seeded system message.
    let messages = engine.messages(matched.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_system());

    // People talk; the seed is never replayed.
    engine
        .append_message(matched.id, "alice", "hey you")
        .await
        .unwrap();
    engine.ensure_thread(matched.id, None).await.unwrap();
    let messages = engine.messages(matched.id).await.unwrap();
    assert_eq!(messages.len(), 2);

    // Fast-forward past the window.
    let mut expired = matched.clone();
    expired.expires_at = Utc::now() - Duration::seconds(1);
    store.update_match(&expired).await.unwrap();

    assert!(engine.get_active_matches("alice").await.unwrap().is_empty());
    assert!(expiry::is_expired(
        &store.get_match(matched.id).await.unwrap().unwrap(),
        Utc::now()
    ));

    // One side asking to reconnect changes nothing yet.
    let after_alice = engine.request_reconnect(matched.id, "alice").await.unwrap();
    assert!(expiry::is_expired(&after_alice, Utc::now()));
    assert!(engine.get_active_matches("bob").await.unwrap().is_empty());

    // The second consent revives: fresh window, flags consumed.
    let revived = engine.request_reconnect(matched.id, "bob").await.unwrap();
    assert!(revived.active);
    assert!(!expiry::is_expired(&revived, Utc::now()));
    assert!(revived.reconnect_requested_a.is_none());
    assert!(revived.reconnect_requested_b.is_none());
    assert!(revived.reconnected_at.is_some());
    assert_eq!(engine.get_active_matches("alice").await.unwrap().len(), 1);

    // A like after expiry-and-revival finds the same record, never a twin.
    let outcome = engine.record_like("alice", "bob", "v1").await.unwrap();
    let LikeOutcome::AlreadyMatched(same) = outcome else {
        panic!("the revived match should be reported");
    };
    assert_eq!(same.id, matched.id);
}

#[tokio::test]
async fn racing_reciprocal_likes_create_exactly_one_match() {
    let (engine, store) = engine_at_venue("v1", &["alice", "bob"]).await;

    let (from_alice, from_bob) = tokio::join!(
        engine.record_like("alice", "bob", "v1"),
        engine.record_like("bob", "alice", "v1"),
    );
    let outcomes = [from_alice.unwrap(), from_bob.unwrap()];

    // However the two calls interleaved, the pair ends up with one match.
    let survivor = store
        .find_match_for_pair("bob", "alice")
        .await
        .unwrap()
        .expect("at least one side must have observed mutuality");
    for outcome in &outcomes {
        if let LikeOutcome::Matched(m) | LikeOutcome::AlreadyMatched(m) = outcome {
            assert_eq!(m.id, survivor.id);
        }
    }

    let alice_matches = engine.get_active_matches("alice").await.unwrap();
    let bob_matches = engine.get_active_matches("bob").await.unwrap();
    assert_eq!(alice_matches.len(), 1);
    assert_eq!(bob_matches.len(), 1);
    assert_eq!(alice_matches[0].id, bob_matches[0].id);

    // One thread, one seed message.
    let messages = engine.messages(survivor.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].is_system());
}

#[tokio::test]
async fn expired_pair_must_reconnect_not_rematch() {
    let (engine, store) = engine_at_venue("v1", &["alice", "bob"]).await;

    engine.record_like("alice", "bob", "v1").await.unwrap();
    let LikeOutcome::Matched(matched) =
        engine.record_like("bob", "alice", "v1").await.unwrap()
    else {
        panic!("reciprocal like must create the match");
    };

    let mut expired = matched.clone();
    expired.expires_at = Utc::now() - Duration::hours(1);
    store.update_match(&expired).await.unwrap();

    // Fresh mutual likes after expiry route to reconnect instead of
    // creating a duplicate.
    engine.undo_like("alice", "bob").await.unwrap();
    engine.undo_like("bob", "alice").await.unwrap();
    engine.record_like("alice", "bob", "v1").await.unwrap();
    let outcome = engine.record_like("bob", "alice", "v1").await.unwrap();
    let LikeOutcome::ReconnectRequired(pending) = outcome else {
        panic!("expired match must not be silently replaced");
    };
    assert_eq!(pending.id, matched.id);

    let all_for_alice = store.matches_for_user("alice").await.unwrap();
    assert_eq!(all_for_alice.len(), 1);
}

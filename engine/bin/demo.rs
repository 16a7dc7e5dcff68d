use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Arg, Command};
use sparq::constants::{DEFAULT_DEMO_MATCH_PROBABILITY, DEMO_CAST};
use sparq::db::{MemoryStore, Store};
use sparq::services::{Engine, LikeOutcome, LogNotifier, MatchDecision, StaticRoster, expiry};
use sparq::utils::{Config, init_logging};
use tracing::{info, warn};

// Scripted walkthrough of the whole lifecycle on the in-memory store:
// seed a venue, spend likes, land a match, let it expire, reconnect.

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = Command::new("sparq-demo")
        .about("Walk the like/match/expire/reconnect flow against an in-memory store")
        .arg(
            Arg::new("venue")
                .long("venue")
                .help("Venue id to seed")
                .default_value("demo-velvet-room"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .help("The user driving the walkthrough")
                .default_value("demo-user"),
        )
        .arg(
            Arg::new("random-matching")
                .long("random-matching")
                .help("Use the probabilistic demo matcher instead of real mutual detection")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let venue = args.get_one::<String>("venue").unwrap().clone();
    let user = args.get_one::<String>("user").unwrap().clone();
    let random_matching = args.get_flag("random-matching");

    let config = Config {
        match_decision: if random_matching {
            MatchDecision::Demo {
                probability: DEFAULT_DEMO_MATCH_PROBABILITY,
            }
        } else {
            MatchDecision::Reciprocal
        },
        ..Config::default()
    };

    let store = Arc::new(MemoryStore::new());
    let roster = Arc::new(StaticRoster::new());
    roster.name_venue(&venue, "The Velvet Room").await;
    roster.check_in(&user, &venue).await;
    for cast_member in DEMO_CAST {
        roster.check_in(cast_member, &venue).await;
    }

    let engine = Engine::new(
        store.clone(),
        roster.clone(),
        Arc::new(LogNotifier),
        config,
    );

    if engine.seed_demo_data(&venue, &user).await? {
        info!("🌆 Seeded {} and checked everyone in", venue);
    }

    let likers = engine.likers_of(&user, &venue).await?;
    info!(
        "👀 {} people already like {}: {:?}",
        likers.len(),
        user,
        likers.iter().map(|i| i.from_user_id.as_str()).collect::<Vec<_>>()
    );

    // Spend likes down the cast list until one lands a match.
    let mut matched = None;
    for cast_member in DEMO_CAST {
        match engine.record_like(&user, cast_member, &venue).await {
            Ok(LikeOutcome::Matched(m)) => {
                info!("🎉 Matched with {}!", cast_member);
                matched = Some(m);
                break;
            }
            Ok(LikeOutcome::Recorded { remaining }) => {
                info!("💭 {} hasn't liked back ({} likes left)", cast_member, remaining);
            }
            Ok(LikeOutcome::AlreadyMatched(m)) => {
                info!("♻️ Already matched with {}", cast_member);
                matched = Some(m);
                break;
            }
            Ok(LikeOutcome::ReconnectRequired(m)) => {
                info!("⌛ Old match with {} expired; reconnect needed", cast_member);
                matched = Some(m);
                break;
            }
            Err(e) => warn!("🚫 {}", e.user_message()),
        }
    }

    let Some(m) = matched else {
        info!("😴 No match this time. Run again (or try --random-matching).");
        return Ok(());
    };

    let now = Utc::now();
    info!(
        "⏳ Window open for another {}s at {}",
        expiry::remaining_seconds(&m, now),
        m.venue_name
    );
    info!("📇 Match record:\n{}", serde_json::to_string_pretty(&m)?);

    engine.append_message(m.id, &user, "hey! saw you across the room 👋").await?;
    for message in engine.messages(m.id).await? {
        let sender = message.sender_id.as_deref().unwrap_or("system");
        info!("💬 [{}] {}", sender, message.text);
    }

    // Fast-forward past the window to show the reconnect flow.
    let mut expired = m.clone();
    expired.expires_at = Utc::now() - Duration::seconds(1);
    store.update_match(&expired).await?;
    info!(
        "🌙 The night ends; active matches now: {}",
        engine.get_active_matches(&user).await?.len()
    );

    let peer = expired
        .peer_of(&user)
        .unwrap_or(expired.user_a.as_str())
        .to_string();
    let one_sided = engine.request_reconnect(m.id, &user).await?;
    info!(
        "🔁 {} asked to reconnect; revived: {}",
        user,
        !expiry::is_expired(&one_sided, Utc::now())
    );
    let revived = engine.request_reconnect(m.id, &peer).await?;
    info!(
        "🔥 {} agreed; match live again for {}s",
        peer,
        expiry::remaining_seconds(&revived, Utc::now())
    );

    Ok(())
}

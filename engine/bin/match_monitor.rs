use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use sparq::constants::{MONITOR_HEARTBEAT_EVERY_N_ITERS, MONITOR_POLL_INTERVAL_SECS};
use sparq::db::{DatabaseConfig, PgStore, Store, get_db_pool};
use sparq::services::notify::{LogNotifier, Notifier};
use sparq::services::expiry;
use sparq::utils::{Config, init_logging};
use tokio::time;
use tracing::{error, info, warn};
use uuid::Uuid;

// The engine computes expiry lazily on read; this worker is the external
// poller that keeps cached `active` flags honest and drives countdown
// notifications. It holds no state the engine depends on.

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("⏱️ Starting Sparq match monitor...");

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;
    let store = PgStore::new(pool);

    run_monitor(store, LogNotifier, config).await
}

async fn run_monitor(store: PgStore, notifier: LogNotifier, config: Config) -> Result<()> {
    let mut interval = time::interval(Duration::from_secs(MONITOR_POLL_INTERVAL_SECS));
    let mut iter_count: usize = 0;
    let mut notified: HashSet<Uuid> = HashSet::new();

    loop {
        interval.tick().await;
        iter_count += 1;
        let now = Utc::now();

        // 1. Flush active flags that expiry has overtaken. Readers never
        //    trust the flag, but raw queries and dashboards do.
        match store.stale_active_matches(now).await {
            Ok(stale) => {
                let mut flushed = 0;
                for mut m in stale {
                    m.active = false;
                    match store.update_match(&m).await {
                        Ok(()) => {
                            flushed += 1;
                            notified.remove(&m.id);
                        }
                        Err(e) => {
                            error!("❌ Failed to flush expired flag on match {}: {}", m.id, e)
                        }
                    }
                }
                if flushed > 0 {
                    info!("🧹 Marked {} expired matches inactive", flushed);
                }
            }
            Err(e) => error!("❌ Failed to scan for expired matches: {}", e),
        }

        // 2. Countdown warnings for windows about to close, once per match.
        let deadline = now + config.expiring_soon_threshold();
        match store.matches_expiring_before(now, deadline).await {
            Ok(closing) => {
                for m in closing {
                    if notified.contains(&m.id) {
                        continue;
                    }
                    let seconds_left = expiry::remaining_seconds(&m, now);
                    match notifier.match_expiring(&m, seconds_left).await {
                        Ok(()) => {
                            notified.insert(m.id);
                        }
                        Err(e) => {
                            warn!("⚠️ Expiry notification for match {} failed: {}", m.id, e)
                        }
                    }
                }
            }
            Err(e) => error!("❌ Failed to scan for expiring matches: {}", e),
        }

        if iter_count % MONITOR_HEARTBEAT_EVERY_N_ITERS == 0 {
            info!(
                "📊 Monitor iteration {} | {} matches in countdown",
                iter_count,
                notified.len()
            );
        }
    }
}

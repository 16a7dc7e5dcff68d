use anyhow::Result;
use chrono::Duration;
use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_DEMO_MATCH_PROBABILITY, DEFAULT_EXPIRING_SOON_MINUTES, DEFAULT_LIKES_PER_VENUE,
    DEFAULT_MATCH_WINDOW_HOURS,
};
use crate::services::MatchDecision;

#[derive(Debug, Clone)]
pub struct Config {
    pub match_window_hours: i64,
    pub likes_per_venue: i32,
    pub expiring_soon_minutes: i64,
    pub match_decision: MatchDecision,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let match_decision = match env::var("MATCH_DECISION").as_deref() {
            Ok("demo") => MatchDecision::Demo {
                probability: env_or("DEMO_MATCH_PROBABILITY", DEFAULT_DEMO_MATCH_PROBABILITY),
            },
            _ => MatchDecision::Reciprocal,
        };

        Ok(Self {
            match_window_hours: env_or("MATCH_WINDOW_HOURS", DEFAULT_MATCH_WINDOW_HOURS),
            likes_per_venue: env_or("LIKES_PER_VENUE", DEFAULT_LIKES_PER_VENUE).max(0),
            expiring_soon_minutes: env_or("EXPIRING_SOON_MINUTES", DEFAULT_EXPIRING_SOON_MINUTES),
            match_decision,
        })
    }

    /// The single window constant: how long likes and matches stay open.
    pub fn match_window(&self) -> Duration {
        Duration::hours(self.match_window_hours)
    }

    pub fn expiring_soon_threshold(&self) -> Duration {
        Duration::minutes(self.expiring_soon_minutes)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            match_window_hours: DEFAULT_MATCH_WINDOW_HOURS,
            likes_per_venue: DEFAULT_LIKES_PER_VENUE,
            expiring_soon_minutes: DEFAULT_EXPIRING_SOON_MINUTES,
            match_decision: MatchDecision::Reciprocal,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

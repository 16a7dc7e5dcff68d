// =============================================================================
// Sparq Engine Constants
// =============================================================================
// This file contains all constants used throughout the engine to enable
// easy tuning and configuration from a single location.

// =============================================================================
// MATCH LIFECYCLE
// =============================================================================

/// How long a match (and a pending like) stays open, in hours
pub const DEFAULT_MATCH_WINDOW_HOURS: i64 = 24;

/// Likes a user gets per venue check-in
pub const DEFAULT_LIKES_PER_VENUE: i32 = 3;

/// A match counts as "expiring soon" this many minutes before its window closes
pub const DEFAULT_EXPIRING_SOON_MINUTES: i64 = 30;

// =============================================================================
// DEMO MODE
// =============================================================================

/// Chance that a fresh like lands a match under the probabilistic demo matcher
pub const DEFAULT_DEMO_MATCH_PROBABILITY: f64 = 0.6;

/// Cast of fake profiles the demo seeder checks in
pub const DEMO_CAST: [&str; 4] = ["demo-ava", "demo-leo", "demo-mia", "demo-noah"];

/// How many cast members start out already liking the demo user
pub const DEMO_SEED_LIKES: usize = 2;

// =============================================================================
// CHAT
// =============================================================================

/// System message seeded into every fresh thread
pub const OPENING_MESSAGE_TEXT: &str = "It's a match! Say hi before the window closes.";

// =============================================================================
// MATCH MONITOR
// =============================================================================

/// How often the match monitor scans for expired and expiring matches
pub const MONITOR_POLL_INTERVAL_SECS: u64 = 30;

/// Log a quiet-state heartbeat every N monitor iterations
pub const MONITOR_HEARTBEAT_EVERY_N_ITERS: usize = 20;

// =============================================================================
// DATABASE CONFIGURATION
// =============================================================================

/// Default connection pool size if not specified in environment
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

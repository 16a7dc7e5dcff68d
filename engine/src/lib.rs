pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use db::{MemoryStore, PgStore, Store, get_db_pool};
pub use error::{EngineError, EngineResult};
pub use services::{Engine, LikeOutcome, MatchDecision};
pub use utils::config::Config;

// Re-export common types
pub use anyhow::Result;
pub use chrono::{DateTime, Utc};
pub use sqlx::PgPool;
pub use uuid::Uuid;

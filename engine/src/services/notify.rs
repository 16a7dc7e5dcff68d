use async_trait::async_trait;
use tracing::info;

use crate::models::{ChatMessage, Match};

/// Fire-and-forget side effects: push delivery, bot-reply scheduling,
/// analytics. A failed dispatch gets logged and dropped; it never unwinds
/// engine state.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A new active window opened for the pair (fresh match or revival).
    async fn match_opened(&self, m: &Match) -> anyhow::Result<()>;

    /// One side asked to reconnect; the other side hasn't yet.
    async fn reconnect_requested(&self, m: &Match, requested_by: &str) -> anyhow::Result<()>;

    /// A match's window closes within the configured threshold.
    async fn match_expiring(&self, m: &Match, seconds_left: i64) -> anyhow::Result<()>;

    /// A message was persisted; downstream workers key off this.
    async fn message_appended(&self, message: &ChatMessage) -> anyhow::Result<()>;
}

/// Swallows everything. The default for embedders that wire their own
/// delivery elsewhere, and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn match_opened(&self, _m: &Match) -> anyhow::Result<()> {
        Ok(())
    }

    async fn reconnect_requested(&self, _m: &Match, _requested_by: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn match_expiring(&self, _m: &Match, _seconds_left: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn message_appended(&self, _message: &ChatMessage) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Logs every event. Used by the operational binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn match_opened(&self, m: &Match) -> anyhow::Result<()> {
        info!(
            "💌 match {}: {} <-> {} at {} (window closes {})",
            m.id, m.user_a, m.user_b, m.venue_name, m.expires_at
        );
        Ok(())
    }

    async fn reconnect_requested(&self, m: &Match, requested_by: &str) -> anyhow::Result<()> {
        info!("🔁 match {}: {} wants to reconnect", m.id, requested_by);
        Ok(())
    }

    async fn match_expiring(&self, m: &Match, seconds_left: i64) -> anyhow::Result<()> {
        info!(
            "⏳ match {}: {}s left for {} and {}",
            m.id, seconds_left, m.user_a, m.user_b
        );
        Ok(())
    }

    async fn message_appended(&self, message: &ChatMessage) -> anyhow::Result<()> {
        info!(
            "💬 match {}: message {} appended",
            message.match_id, message.id
        );
        Ok(())
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{MatchInsert, Store, StoreError, StoreResult};
use crate::models::{ChatMessage, ChatThread, Interest, LikesQuota, Match, canonical_pair};

/// Postgres backend. Statements go through the runtime query API; the pair
/// uniqueness constraint on `matches` arbitrates the create-if-absent race.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut => {
                StoreError::Timeout("database connection pool timed out".to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Corrupt(err.to_string())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

const INTEREST_COLUMNS: &str = "from_user_id, to_user_id, venue_id, created_at, expires_at, active";

const MATCH_COLUMNS: &str = "id, user_a, user_b, venue_id, venue_name, created_at, expires_at, \
     active, contact_shared, reconnect_requested_a, reconnect_requested_b, reconnected_at, met";

const UPSERT_INTEREST: &str = r#"
    INSERT INTO interests (from_user_id, to_user_id, venue_id, created_at, expires_at, active)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (from_user_id, to_user_id, venue_id)
    DO UPDATE SET created_at = EXCLUDED.created_at,
                  expires_at = EXCLUDED.expires_at,
                  active = EXCLUDED.active
"#;

const UPSERT_QUOTA: &str = r#"
    INSERT INTO likes_quotas (user_id, venue_id, remaining, updated_at)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (user_id, venue_id)
    DO UPDATE SET remaining = EXCLUDED.remaining,
                  updated_at = EXCLUDED.updated_at
"#;

#[async_trait]
impl Store for PgStore {
    async fn get_interest(
        &self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> StoreResult<Option<Interest>> {
        let interest = sqlx::query_as::<_, Interest>(&format!(
            r#"
            SELECT {INTEREST_COLUMNS}
            FROM interests
            WHERE from_user_id = $1 AND to_user_id = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(from_user_id)
        .bind(to_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(interest)
    }

    async fn save_interest(&self, interest: &Interest) -> StoreResult<()> {
        sqlx::query(UPSERT_INTEREST)
            .bind(&interest.from_user_id)
            .bind(&interest.to_user_id)
            .bind(&interest.venue_id)
            .bind(interest.created_at)
            .bind(interest.expires_at)
            .bind(interest.active)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn record_like(&self, interest: &Interest, quota: &LikesQuota) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // One live like per directed pair: retire any earlier row (possibly
        // at another venue) before the fresh one lands.
        sqlx::query("UPDATE interests SET active = FALSE WHERE from_user_id = $1 AND to_user_id = $2")
            .bind(&interest.from_user_id)
            .bind(&interest.to_user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(UPSERT_INTEREST)
            .bind(&interest.from_user_id)
            .bind(&interest.to_user_id)
            .bind(&interest.venue_id)
            .bind(interest.created_at)
            .bind(interest.expires_at)
            .bind(interest.active)
            .execute(&mut *tx)
            .await?;

        sqlx::query(UPSERT_QUOTA)
            .bind(&quota.user_id)
            .bind(&quota.venue_id)
            .bind(quota.remaining)
            .bind(quota.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_quota(&self, user_id: &str, venue_id: &str) -> StoreResult<Option<LikesQuota>> {
        let quota = sqlx::query_as::<_, LikesQuota>(
            r#"
            SELECT user_id, venue_id, remaining, updated_at
            FROM likes_quotas
            WHERE user_id = $1 AND venue_id = $2
            "#,
        )
        .bind(user_id)
        .bind(venue_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quota)
    }

    async fn save_quota(&self, quota: &LikesQuota) -> StoreResult<()> {
        sqlx::query(UPSERT_QUOTA)
            .bind(&quota.user_id)
            .bind(&quota.venue_id)
            .bind(quota.remaining)
            .bind(quota.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn interests_toward(
        &self,
        to_user_id: &str,
        venue_id: &str,
    ) -> StoreResult<Vec<Interest>> {
        let interests = sqlx::query_as::<_, Interest>(&format!(
            r#"
            SELECT {INTEREST_COLUMNS}
            FROM interests
            WHERE to_user_id = $1 AND venue_id = $2 AND active
            ORDER BY created_at DESC
            "#
        ))
        .bind(to_user_id)
        .bind(venue_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(interests)
    }

    async fn get_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let found = sqlx::query_as::<_, Match>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found)
    }

    async fn find_match_for_pair(
        &self,
        user_1: &str,
        user_2: &str,
    ) -> StoreResult<Option<Match>> {
        let (user_a, user_b) = canonical_pair(user_1, user_2);
        let found = sqlx::query_as::<_, Match>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE user_a = $1 AND user_b = $2"
        ))
        .bind(user_a)
        .bind(user_b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(found)
    }

    async fn insert_match_if_absent(&self, candidate: &Match) -> StoreResult<MatchInsert> {
        let (user_a, user_b) = canonical_pair(&candidate.user_a, &candidate.user_b);
        let inserted = sqlx::query_as::<_, Match>(&format!(
            r#"
            INSERT INTO matches ({MATCH_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_a, user_b) DO NOTHING
            RETURNING {MATCH_COLUMNS}
            "#
        ))
        .bind(candidate.id)
        .bind(user_a)
        .bind(user_b)
        .bind(&candidate.venue_id)
        .bind(&candidate.venue_name)
        .bind(candidate.created_at)
        .bind(candidate.expires_at)
        .bind(candidate.active)
        .bind(candidate.contact_shared)
        .bind(candidate.reconnect_requested_a)
        .bind(candidate.reconnect_requested_b)
        .bind(candidate.reconnected_at)
        .bind(candidate.met)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(created) => Ok(MatchInsert::Created(created)),
            None => {
                let existing = self
                    .find_match_for_pair(user_a, user_b)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Corrupt(format!(
                            "match for pair ({user_a}, {user_b}) vanished after conflicting insert"
                        ))
                    })?;
                Ok(MatchInsert::Raced(existing))
            }
        }
    }

    async fn update_match(&self, updated: &Match) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE matches
            SET venue_name = $2, expires_at = $3, active = $4, contact_shared = $5,
                reconnect_requested_a = $6, reconnect_requested_b = $7,
                reconnected_at = $8, met = $9
            WHERE id = $1
            "#,
        )
        .bind(updated.id)
        .bind(&updated.venue_name)
        .bind(updated.expires_at)
        .bind(updated.active)
        .bind(updated.contact_shared)
        .bind(updated.reconnect_requested_a)
        .bind(updated.reconnect_requested_b)
        .bind(updated.reconnected_at)
        .bind(updated.met)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn matches_for_user(&self, user_id: &str) -> StoreResult<Vec<Match>> {
        let found = sqlx::query_as::<_, Match>(&format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE user_a = $1 OR user_b = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(found)
    }

    async fn stale_active_matches(&self, now: DateTime<Utc>) -> StoreResult<Vec<Match>> {
        let found = sqlx::query_as::<_, Match>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE active AND expires_at <= $1"
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(found)
    }

    async fn matches_expiring_before(
        &self,
        now: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> StoreResult<Vec<Match>> {
        let found = sqlx::query_as::<_, Match>(&format!(
            r#"
            SELECT {MATCH_COLUMNS}
            FROM matches
            WHERE expires_at > $1 AND expires_at <= $2
            ORDER BY expires_at ASC
            "#
        ))
        .bind(now)
        .bind(deadline)
        .fetch_all(&self.pool)
        .await?;

        Ok(found)
    }

    async fn get_thread(&self, match_id: Uuid) -> StoreResult<Option<ChatThread>> {
        let thread = sqlx::query_as::<_, ChatThread>(
            "SELECT match_id, name, created_at FROM chat_threads WHERE match_id = $1",
        )
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(thread)
    }

    async fn insert_thread_if_absent(&self, thread: &ChatThread) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_threads (match_id, name, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (match_id) DO NOTHING
            "#,
        )
        .bind(thread.match_id)
        .bind(&thread.name)
        .bind(thread.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn messages_for_match(&self, match_id: Uuid) -> StoreResult<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, match_id, sender_id, text, sent_at
            FROM chat_messages
            WHERE match_id = $1
            ORDER BY sent_at ASC
            "#,
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn append_message(&self, message: &ChatMessage) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, match_id, sender_id, text, sent_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(message.id)
        .bind(message.match_id)
        .bind(&message.sender_id)
        .bind(&message.text)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn append_message_if_first(&self, message: &ChatMessage) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO chat_messages (id, match_id, sender_id, text, sent_at)
            SELECT $1, $2, $3, $4, $5
            WHERE NOT EXISTS (SELECT 1 FROM chat_messages WHERE match_id = $2)
            "#,
        )
        .bind(message.id)
        .bind(message.match_id)
        .bind(&message.sender_id)
        .bind(&message.text)
        .bind(message.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

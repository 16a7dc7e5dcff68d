use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::constants::OPENING_MESSAGE_TEXT;
use crate::db::Store;
use crate::error::{EngineError, EngineResult};
use crate::models::{ChatMessage, ChatThread};
use crate::services::notify::Notifier;

/// Owns chat threads. A thread exists from the moment its match does; both
/// the thread record and the single seeded opener are idempotent, so
/// re-running `ensure_thread` after a crash or a double-tap changes nothing.
#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
}

impl ChatService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub async fn ensure_thread(
        &self,
        match_id: Uuid,
        name: Option<&str>,
    ) -> EngineResult<ChatThread> {
        let now = Utc::now();
        let thread = match self.store.get_thread(match_id).await? {
            Some(existing) => existing,
            None => {
                let fresh = ChatThread {
                    match_id,
                    name: name.map(str::to_string),
                    created_at: now,
                };
                self.store.insert_thread_if_absent(&fresh).await?;
                // If another creator got there first, its record wins.
                self.store.get_thread(match_id).await?.unwrap_or(fresh)
            }
        };

        let seed = ChatMessage {
            id: Uuid::new_v4(),
            match_id,
            sender_id: None,
            text: OPENING_MESSAGE_TEXT.to_string(),
            sent_at: now,
        };
        self.store.append_message_if_first(&seed).await?;

        Ok(thread)
    }

    pub async fn append_message(
        &self,
        match_id: Uuid,
        sender_id: &str,
        text: &str,
    ) -> EngineResult<ChatMessage> {
        if self.store.get_thread(match_id).await?.is_none() {
            return Err(EngineError::ThreadNotFound(match_id));
        }

        let message = ChatMessage {
            id: Uuid::new_v4(),
            match_id,
            sender_id: Some(sender_id.to_string()),
            text: text.to_string(),
            sent_at: Utc::now(),
        };
        self.store.append_message(&message).await?;

        // Downstream workers (bot replies, pushes) hang off this event; a
        // dropped dispatch must not fail the append.
        if let Err(e) = self.notifier.message_appended(&message).await {
            warn!("message event dispatch failed for match {match_id}: {e:#}");
        }

        Ok(message)
    }

    pub async fn messages(&self, match_id: Uuid) -> EngineResult<Vec<ChatMessage>> {
        Ok(self.store.messages_for_match(match_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Match;
    use crate::services::notify::NoopNotifier;

    #[derive(Default)]
    struct CountingNotifier {
        appended: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn match_opened(&self, _m: &Match) -> anyhow::Result<()> {
            Ok(())
        }

        async fn reconnect_requested(&self, _m: &Match, _by: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn match_expiring(&self, _m: &Match, _left: i64) -> anyhow::Result<()> {
            Ok(())
        }

        async fn message_appended(&self, _message: &ChatMessage) -> anyhow::Result<()> {
            self.appended.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn service() -> ChatService {
        ChatService::new(Arc::new(MemoryStore::new()), Arc::new(NoopNotifier))
    }

    #[tokio::test]
    async fn ensure_thread_seeds_exactly_once() {
        let chat = service();
        let match_id = Uuid::new_v4();

        for _ in 0..3 {
            chat.ensure_thread(match_id, Some("Ava")).await.unwrap();
        }

        let messages = chat.messages(match_id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_system());
        assert_eq!(messages[0].text, OPENING_MESSAGE_TEXT);
    }

    #[tokio::test]
    async fn seed_is_not_replayed_once_people_are_talking() {
        let chat = service();
        let match_id = Uuid::new_v4();

        chat.ensure_thread(match_id, None).await.unwrap();
        chat.append_message(match_id, "alice", "hey!").await.unwrap();
        chat.ensure_thread(match_id, None).await.unwrap();

        let messages = chat.messages(match_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages.iter().filter(|m| m.is_system()).count(), 1);
    }

    #[tokio::test]
    async fn append_requires_a_thread() {
        let chat = service();
        let err = chat
            .append_message(Uuid::new_v4(), "alice", "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ThreadNotFound(_)));
    }

    #[tokio::test]
    async fn append_emits_one_event_per_message() {
        let notifier = Arc::new(CountingNotifier::default());
        let chat = ChatService::new(Arc::new(MemoryStore::new()), notifier.clone());
        let match_id = Uuid::new_v4();

        chat.ensure_thread(match_id, None).await.unwrap();
        chat.append_message(match_id, "alice", "hi").await.unwrap();
        chat.append_message(match_id, "bob", "hi back").await.unwrap();

        assert_eq!(notifier.appended.load(Ordering::SeqCst), 2);
    }
}

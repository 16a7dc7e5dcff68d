pub mod chat;
pub mod decision;
pub mod demo;
pub mod expiry;
pub mod likes;
pub mod matches;
pub mod notify;
pub mod presence;
pub mod reconnect;

pub use chat::ChatService;
pub use decision::MatchDecision;
pub use likes::{LikeOutcome, LikeService};
pub use matches::{MatchService, MutualOutcome};
pub use notify::{LogNotifier, NoopNotifier, Notifier};
pub use presence::{CheckinDirectory, StaticRoster};
pub use reconnect::ReconnectService;

use std::sync::Arc;

use uuid::Uuid;

use crate::db::Store;
use crate::error::EngineResult;
use crate::models::{ChatMessage, ChatThread, Interest, LikesQuota, Match};
use crate::utils::Config;

/// The inbound surface: wires the store, the check-in directory, and the
/// notifier into the like/match/reconnect/chat services so app code holds
/// one handle.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn Store>,
    config: Config,
    likes: LikeService,
    matches: MatchService,
    reconnect: ReconnectService,
    chat: ChatService,
}

impl Engine {
    pub fn new(
        store: Arc<dyn Store>,
        directory: Arc<dyn CheckinDirectory>,
        notifier: Arc<dyn Notifier>,
        config: Config,
    ) -> Self {
        let chat = ChatService::new(store.clone(), notifier.clone());
        let matches = MatchService::new(
            store.clone(),
            notifier.clone(),
            chat.clone(),
            config.clone(),
        );
        let likes = LikeService::new(store.clone(), directory, matches.clone(), config.clone());
        let reconnect = ReconnectService::new(store.clone(), notifier, config.clone());
        Self {
            store,
            config,
            likes,
            matches,
            reconnect,
            chat,
        }
    }

    pub async fn record_like(
        &self,
        from_user_id: &str,
        to_user_id: &str,
        venue_id: &str,
    ) -> EngineResult<LikeOutcome> {
        self.likes.record_like(from_user_id, to_user_id, venue_id).await
    }

    pub async fn undo_like(&self, from_user_id: &str, to_user_id: &str) -> EngineResult<()> {
        self.likes.undo_like(from_user_id, to_user_id).await
    }

    pub async fn is_mutual(&self, user_1: &str, user_2: &str) -> EngineResult<bool> {
        self.likes.is_mutual(user_1, user_2).await
    }

    pub async fn likers_of(&self, user_id: &str, venue_id: &str) -> EngineResult<Vec<Interest>> {
        self.likes.likers_of(user_id, venue_id).await
    }

    pub async fn reset_quota(&self, user_id: &str, venue_id: &str) -> EngineResult<LikesQuota> {
        self.likes.reset_quota(user_id, venue_id).await
    }

    pub async fn get_active_matches(&self, user_id: &str) -> EngineResult<Vec<Match>> {
        self.matches.get_active_matches(user_id).await
    }

    pub async fn mark_as_met(&self, match_id: Uuid) -> EngineResult<Match> {
        self.matches.mark_as_met(match_id).await
    }

    pub async fn share_contact(&self, match_id: Uuid, user_id: &str) -> EngineResult<Match> {
        self.matches.share_contact(match_id, user_id).await
    }

    pub async fn request_reconnect(&self, match_id: Uuid, user_id: &str) -> EngineResult<Match> {
        self.reconnect.request_reconnect(match_id, user_id).await
    }

    pub async fn ensure_thread(
        &self,
        match_id: Uuid,
        peer_display_name: Option<&str>,
    ) -> EngineResult<ChatThread> {
        self.chat.ensure_thread(match_id, peer_display_name).await
    }

    pub async fn append_message(
        &self,
        match_id: Uuid,
        sender_id: &str,
        text: &str,
    ) -> EngineResult<ChatMessage> {
        self.chat.append_message(match_id, sender_id, text).await
    }

    pub async fn messages(&self, match_id: Uuid) -> EngineResult<Vec<ChatMessage>> {
        self.chat.messages(match_id).await
    }

    /// Explicit, idempotent demo initialization. Safe to call on every
    /// session start; persisted state decides whether anything happens.
    pub async fn seed_demo_data(&self, venue_id: &str, demo_user: &str) -> EngineResult<bool> {
        demo::seed_demo_data(self.store.as_ref(), &self.config, venue_id, demo_user).await
    }
}

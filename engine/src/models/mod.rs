pub mod chat;
pub mod interests;
pub mod matches;

pub use chat::{ChatMessage, ChatThread};
pub use interests::{Interest, LikesQuota};
pub use matches::{Match, canonical_pair};

use crate::db::DbResult;
use crate::models::chat::ChatRecord;
use crate::models::types::ChatId;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait ChatRepo: Send + Sync {
    /// Create the chat record if it does not exist yet. Existing records are left alone.
    async fn ensure(&self, chat: ChatId, spawn_interval_secs: i64) -> DbResult<ChatRecord>;

    /// Record a message in the chat, creating the record on first contact.
    async fn touch(&self, chat: ChatId, spawn_interval_secs: i64) -> DbResult<ChatRecord>;

    async fn get(&self, chat: ChatId) -> DbResult<Option<ChatRecord>>;

    async fn all(&self) -> DbResult<Vec<ChatRecord>>;

    async fn mark_spawned(&self, chat: ChatId, at: DateTime<Utc>) -> DbResult<()>;

    /// Bulk rewrite of every chat's spawn interval. Returns the number of chats touched.
    async fn set_interval_all(&self, spawn_interval_secs: i64) -> DbResult<u64>;
}

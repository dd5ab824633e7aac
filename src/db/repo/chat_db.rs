use crate::db::repo::chat::ChatRepo;
use crate::db::{Db, DbResult, col, map_row, map_row_opt};
use crate::models::chat::ChatRecord;
use crate::models::types::ChatId;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_postgres::Row;

pub struct ChatRepository {
    db: Arc<Db>,
}

impl ChatRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

const CHAT_COLUMNS: &str = "chat_id, spawn_interval_secs, last_spawn_at, message_count, created_at, updated_at";

impl ChatRecord {
    pub(crate) fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            chat: col(row, "chat_id")?,
            spawn_interval_secs: col(row, "spawn_interval_secs")?,
            last_spawn_at: col(row, "last_spawn_at")?,
            message_count: col(row, "message_count")?,
            created_at: col(row, "created_at")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

#[async_trait::async_trait]
impl ChatRepo for ChatRepository {
    async fn ensure(&self, chat: ChatId, spawn_interval_secs: i64) -> DbResult<ChatRecord> {
        let client = self.db.get_client().await?;

        // DO UPDATE with a no-op so RETURNING also yields the existing row
        let sql = format!(
            r#"
            INSERT INTO chats (chat_id, spawn_interval_secs)
            VALUES ($1, $2)
            ON CONFLICT (chat_id) DO UPDATE SET chat_id = EXCLUDED.chat_id
            RETURNING {CHAT_COLUMNS}
            "#
        );
        let stmt = client.prepare_cached(&sql).await?;

        let row = client.query_one(&stmt, &[&chat, &spawn_interval_secs]).await?;
        map_row(&row, ChatRecord::try_from_row, "ChatRepo::ensure")
    }

    async fn touch(&self, chat: ChatId, spawn_interval_secs: i64) -> DbResult<ChatRecord> {
        let client = self.db.get_client().await?;

        let sql = format!(
            r#"
            INSERT INTO chats (chat_id, spawn_interval_secs, message_count)
            VALUES ($1, $2, 1)
            ON CONFLICT (chat_id)
            DO UPDATE SET message_count = chats.message_count + 1, updated_at = NOW()
            RETURNING {CHAT_COLUMNS}
            "#
        );
        let stmt = client.prepare_cached(&sql).await?;

        let row = client.query_one(&stmt, &[&chat, &spawn_interval_secs]).await?;
        map_row(&row, ChatRecord::try_from_row, "ChatRepo::touch")
    }

    async fn get(&self, chat: ChatId) -> DbResult<Option<ChatRecord>> {
        let client = self.db.get_client().await?;

        let sql = format!("SELECT {CHAT_COLUMNS} FROM chats WHERE chat_id = $1");
        let stmt = client.prepare_cached(&sql).await?;

        let row_opt = client.query_opt(&stmt, &[&chat]).await?;
        map_row_opt(row_opt, ChatRecord::try_from_row, &format!("ChatRepo::get chat={}", chat))
    }

    async fn all(&self) -> DbResult<Vec<ChatRecord>> {
        let client = self.db.get_client().await?;

        let sql = format!("SELECT {CHAT_COLUMNS} FROM chats ORDER BY chat_id");
        let stmt = client.prepare_cached(&sql).await?;

        let rows = client.query(&stmt, &[]).await?;
        rows.iter()
            .map(|row| map_row(row, ChatRecord::try_from_row, "ChatRepo::all"))
            .collect()
    }

    async fn mark_spawned(&self, chat: ChatId, at: DateTime<Utc>) -> DbResult<()> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("UPDATE chats SET last_spawn_at = $2, updated_at = NOW() WHERE chat_id = $1")
            .await?;

        let n = client.execute(&stmt, &[&chat, &at]).await?;
        if n == 0 {
            return Err(crate::db::error::DbError::NotFound);
        }
        Ok(())
    }

    async fn set_interval_all(&self, spawn_interval_secs: i64) -> DbResult<u64> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("UPDATE chats SET spawn_interval_secs = $1, updated_at = NOW()")
            .await?;

        Ok(client.execute(&stmt, &[&spawn_interval_secs]).await?)
    }
}

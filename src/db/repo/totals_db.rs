use crate::db::repo::totals::TotalsRepo;
use crate::db::{Db, DbResult, col, map_row};
use crate::models::totals::{GroupTotal, UserTotal};
use crate::models::types::{ChatId, UserId};
use std::sync::Arc;
use tokio_postgres::Row;

pub struct TotalsRepository {
    db: Arc<Db>,
}

impl TotalsRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

impl UserTotal {
    pub(crate) fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            user: col(row, "user_id")?,
            display_name: col(row, "display_name")?,
            total_caught: col(row, "total_caught")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

impl GroupTotal {
    pub(crate) fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            chat: col(row, "chat_id")?,
            user: col(row, "user_id")?,
            display_name: col(row, "display_name")?,
            total_caught: col(row, "total_caught")?,
            updated_at: col(row, "updated_at")?,
        })
    }
}

#[async_trait::async_trait]
impl TotalsRepo for TotalsRepository {
    async fn bump_user(&self, user: UserId, display_name: Option<&str>, by: i64) -> DbResult<UserTotal> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO user_totals (user_id, display_name, total_caught)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id)
                DO UPDATE SET
                    total_caught = user_totals.total_caught + EXCLUDED.total_caught,
                    display_name = COALESCE(EXCLUDED.display_name, user_totals.display_name),
                    updated_at = NOW()
                RETURNING user_id, display_name, total_caught, updated_at
                "#,
            )
            .await?;

        let row = client.query_one(&stmt, &[&user, &display_name, &by]).await?;
        map_row(&row, UserTotal::try_from_row, "TotalsRepo::bump_user")
    }

    async fn bump_group(
        &self,
        chat: ChatId,
        user: UserId,
        display_name: Option<&str>,
        by: i64,
    ) -> DbResult<GroupTotal> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO group_user_totals (chat_id, user_id, display_name, total_caught)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (chat_id, user_id)
                DO UPDATE SET
                    total_caught = group_user_totals.total_caught + EXCLUDED.total_caught,
                    display_name = COALESCE(EXCLUDED.display_name, group_user_totals.display_name),
                    updated_at = NOW()
                RETURNING chat_id, user_id, display_name, total_caught, updated_at
                "#,
            )
            .await?;

        let row = client.query_one(&stmt, &[&chat, &user, &display_name, &by]).await?;
        map_row(&row, GroupTotal::try_from_row, "TotalsRepo::bump_group")
    }

    async fn top_users(&self, limit: i64) -> DbResult<Vec<UserTotal>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                SELECT user_id, display_name, total_caught, updated_at
                FROM user_totals
                ORDER BY total_caught DESC, updated_at ASC
                LIMIT $1
                "#,
            )
            .await?;

        let rows = client.query(&stmt, &[&limit]).await?;
        rows.iter()
            .map(|row| map_row(row, UserTotal::try_from_row, "TotalsRepo::top_users"))
            .collect()
    }

    async fn top_in_group(&self, chat: ChatId, limit: i64) -> DbResult<Vec<GroupTotal>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                SELECT chat_id, user_id, display_name, total_caught, updated_at
                FROM group_user_totals
                WHERE chat_id = $1
                ORDER BY total_caught DESC, updated_at ASC
                LIMIT $2
                "#,
            )
            .await?;

        let rows = client.query(&stmt, &[&chat, &limit]).await?;
        rows.iter()
            .map(|row| map_row(row, GroupTotal::try_from_row, "TotalsRepo::top_in_group"))
            .collect()
    }
}

use crate::db::repo::inventory::InventoryRepo;
use crate::db::{Db, DbResult, col, map_row, map_row_opt};
use crate::models::inventory::InventoryEntry;
use crate::models::types::{ItemId, UserId};
use std::sync::Arc;
use tokio_postgres::Row;

pub struct InventoryRepository {
    db: Arc<Db>,
}

impl InventoryRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

impl InventoryEntry {
    pub(crate) fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            user: col(row, "user_id")?,
            item: col(row, "item_id")?,
            count: col(row, "count")?,
            first_caught_at: col(row, "first_caught_at")?,
            last_caught_at: col(row, "last_caught_at")?,
        })
    }
}

#[async_trait::async_trait]
impl InventoryRepo for InventoryRepository {
    async fn add(&self, user: UserId, item: ItemId, qty: i64) -> DbResult<InventoryEntry> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO inventory (user_id, item_id, count, first_caught_at, last_caught_at)
                VALUES ($1, $2, $3, NOW(), NOW())
                ON CONFLICT (user_id, item_id)
                DO UPDATE SET count = inventory.count + EXCLUDED.count, last_caught_at = NOW()
                RETURNING user_id, item_id, count, first_caught_at, last_caught_at
                "#,
            )
            .await?;

        let row = client.query_one(&stmt, &[&user, &item, &qty]).await?;
        map_row(&row, InventoryEntry::try_from_row, "InventoryRepo::add")
    }

    async fn remove(&self, user: UserId, item: ItemId, qty: i64) -> DbResult<Option<InventoryEntry>> {
        let mut client = self.db.get_client().await?;
        let tx = client.transaction().await?;

        let row_opt = tx
            .query_opt(
                r#"
                UPDATE inventory SET count = count - $3
                WHERE user_id = $1 AND item_id = $2 AND count > $3
                RETURNING user_id, item_id, count, first_caught_at, last_caught_at
                "#,
                &[&user, &item, &qty],
            )
            .await?;

        if row_opt.is_none() {
            tx.execute(
                "DELETE FROM inventory WHERE user_id = $1 AND item_id = $2 AND count <= $3",
                &[&user, &item, &qty],
            )
            .await?;
        }
        tx.commit().await?;

        map_row_opt(row_opt, InventoryEntry::try_from_row, "InventoryRepo::remove")
    }

    async fn get(&self, user: UserId, item: ItemId) -> DbResult<Option<InventoryEntry>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                SELECT user_id, item_id, count, first_caught_at, last_caught_at
                FROM inventory WHERE user_id = $1 AND item_id = $2
                "#,
            )
            .await?;

        let row_opt = client.query_opt(&stmt, &[&user, &item]).await?;
        map_row_opt(
            row_opt,
            InventoryEntry::try_from_row,
            &format!("InventoryRepo::get user={} item={}", user, item),
        )
    }

    async fn list(&self, user: UserId) -> DbResult<Vec<InventoryEntry>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                SELECT user_id, item_id, count, first_caught_at, last_caught_at
                FROM inventory WHERE user_id = $1
                ORDER BY last_caught_at DESC
                "#,
            )
            .await?;

        let rows = client.query(&stmt, &[&user]).await?;
        rows.iter()
            .map(|row| map_row(row, InventoryEntry::try_from_row, "InventoryRepo::list"))
            .collect()
    }
}

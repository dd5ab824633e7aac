use crate::db::repo::catalog::CatalogRepo;
use crate::db::{Db, DbResult, col, map_row, map_row_opt};
use crate::models::item::Item;
use crate::models::types::ItemId;
use std::sync::Arc;
use tokio_postgres::Row;

pub struct CatalogRepository {
    db: Arc<Db>,
}

impl CatalogRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

impl Item {
    pub(crate) fn try_from_row(row: &Row) -> DbResult<Self> {
        Ok(Self {
            id: col(row, "id")?,
            name: col(row, "name")?,
            series: col(row, "series")?,
            rarity: col(row, "rarity")?,
            media: col(row, "media")?,
            created_at: col(row, "created_at")?,
        })
    }
}

#[async_trait::async_trait]
impl CatalogRepo for CatalogRepository {
    async fn all(&self) -> DbResult<Vec<Item>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT id, name, series, rarity, media, created_at FROM items ORDER BY created_at")
            .await?;

        let rows = client.query(&stmt, &[]).await?;
        rows.iter()
            .map(|row| map_row(row, Item::try_from_row, "CatalogRepo::all"))
            .collect()
    }

    async fn get(&self, item_id: ItemId) -> DbResult<Option<Item>> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached("SELECT id, name, series, rarity, media, created_at FROM items WHERE id = $1")
            .await?;

        let row_opt = client.query_opt(&stmt, &[&item_id]).await?;
        map_row_opt(row_opt, Item::try_from_row, &format!("CatalogRepo::get id={}", item_id))
    }

    async fn insert(&self, item: Item) -> DbResult<Item> {
        let client = self.db.get_client().await?;

        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO items (id, name, series, rarity, media, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, name, series, rarity, media, created_at
                "#,
            )
            .await?;

        let row = client
            .query_one(
                &stmt,
                &[&item.id, &item.name, &item.series, &item.rarity, &item.media, &item.created_at],
            )
            .await?;

        map_row(&row, Item::try_from_row, "CatalogRepo::insert")
    }

    async fn count(&self) -> DbResult<i64> {
        let client = self.db.get_client().await?;
        let row = client.query_one("SELECT COUNT(*) FROM items", &[]).await?;
        Ok(row.get(0))
    }
}

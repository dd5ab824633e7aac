use crate::db::DbResult;
use crate::models::item::Item;
use crate::models::types::ItemId;

#[async_trait::async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Every spawnable item
    async fn all(&self) -> DbResult<Vec<Item>>;

    async fn get(&self, item_id: ItemId) -> DbResult<Option<Item>>;

    /// Fails with `DbError::UniqueViolation` when name + series already exist
    async fn insert(&self, item: Item) -> DbResult<Item>;

    async fn count(&self) -> DbResult<i64>;
}

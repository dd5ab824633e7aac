use crate::db::DbResult;
use crate::models::inventory::InventoryEntry;
use crate::models::types::{ItemId, UserId};

#[async_trait::async_trait]
pub trait InventoryRepo: Send + Sync {
    /// Increment (or create) the (user, item) entry by `qty`, atomically.
    async fn add(&self, user: UserId, item: ItemId, qty: i64) -> DbResult<InventoryEntry>;

    /// Decrement the entry by `qty`, deleting it when nothing is left.
    /// Returns the remaining entry, if any.
    async fn remove(&self, user: UserId, item: ItemId, qty: i64) -> DbResult<Option<InventoryEntry>>;

    async fn get(&self, user: UserId, item: ItemId) -> DbResult<Option<InventoryEntry>>;

    /// All entries of a user, most recently caught first
    async fn list(&self, user: UserId) -> DbResult<Vec<InventoryEntry>>;
}

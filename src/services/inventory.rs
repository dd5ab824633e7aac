use crate::db::repo::{CatalogRepo, InventoryRepo, TotalsRepo};
use crate::error::{AppResult, DomainError};
use crate::models::inventory::{Holding, InventoryEntry};
use crate::models::totals::{GroupTotal, UserTotal};
use crate::models::types::{ChatId, ItemId, UserId};
use crate::util::retry::RetryPolicy;
use std::collections::HashMap;
use std::sync::Arc;

pub struct InventoryService {
    repo: Arc<dyn InventoryRepo>,
    catalog: Arc<dyn CatalogRepo>,
    totals: Arc<dyn TotalsRepo>,
    retry: RetryPolicy,
}

impl InventoryService {
    pub fn new(
        repo: Arc<dyn InventoryRepo>,
        catalog: Arc<dyn CatalogRepo>,
        totals: Arc<dyn TotalsRepo>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            repo,
            catalog,
            totals,
            retry,
        }
    }

    /// Add `qty` copies of `item` to the user's inventory
    pub async fn add(&self, user: UserId, item: ItemId, qty: i64) -> AppResult<InventoryEntry> {
        if qty < 1 {
            return Err(DomainError::Validation {
                field: "qty",
                message: "quantity must be at least 1".into(),
            });
        }
        let entry = self
            .retry
            .run("inventory.add", || self.repo.add(user, item, qty))
            .await?;
        Ok(entry)
    }

    /// Undo an earlier `add`. Only used to compensate a reward that did not complete.
    pub async fn revert(&self, user: UserId, item: ItemId, qty: i64) -> AppResult<()> {
        self.retry
            .run("inventory.remove", || self.repo.remove(user, item, qty))
            .await?;
        Ok(())
    }

    pub async fn list(&self, user: UserId) -> AppResult<Vec<InventoryEntry>> {
        Ok(self.retry.run("inventory.list", || self.repo.list(user)).await?)
    }

    /// Inventory joined with the catalog, most recent catch first
    pub async fn holdings(&self, user: UserId) -> AppResult<Vec<Holding>> {
        let entries = self.list(user).await?;
        if entries.is_empty() {
            return Ok(vec![]);
        }

        let items: HashMap<ItemId, _> = self
            .retry
            .run("catalog.all", || self.catalog.all())
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        Ok(entries
            .into_iter()
            .filter_map(|e| {
                items.get(&e.item).map(|item| Holding {
                    item: item.clone(),
                    count: e.count,
                    last_caught_at: e.last_caught_at,
                })
            })
            .collect())
    }

    /// Bumps the leaderboards after a win. Failures are logged, never returned:
    /// the inventory is what counts.
    pub async fn record_catch(&self, chat: ChatId, user: UserId, display_name: Option<&str>) {
        if let Err(e) = self.totals.bump_user(user, display_name, 1).await {
            tracing::warn!(user = %user, error = %e, "failed to update global total");
        }
        if let Err(e) = self.totals.bump_group(chat, user, display_name, 1).await {
            tracing::warn!(chat = %chat, user = %user, error = %e, "failed to update group total");
        }
    }

    pub async fn top_users(&self, limit: i64) -> AppResult<Vec<UserTotal>> {
        Ok(self.retry.run("totals.top_users", || self.totals.top_users(limit)).await?)
    }

    pub async fn top_in_group(&self, chat: ChatId, limit: i64) -> AppResult<Vec<GroupTotal>> {
        Ok(self
            .retry
            .run("totals.top_in_group", || self.totals.top_in_group(chat, limit))
            .await?)
    }
}

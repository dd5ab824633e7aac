use crate::db::DbResult;
use crate::db::error::DbError;
use crate::db::repo::{BalanceRepo, CatalogRepo, ChatRepo, InventoryRepo, TotalsRepo};
use crate::models::balance::{Balance, DeltaOutcome};
use crate::models::chat::ChatRecord;
use crate::models::inventory::InventoryEntry;
use crate::models::item::Item;
use crate::models::totals::{GroupTotal, UserTotal};
use crate::models::types::{ChatId, ItemId, UserId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

/// Process-local store implementing every repo trait. Used by the test suite
/// and for `--store memory`. A DashMap shard lock held through `entry()` /
/// `get_mut()` is what makes each single-record update atomic.
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<Vec<Item>>,
    balances: DashMap<UserId, Balance>,
    inventory: DashMap<(UserId, ItemId), InventoryEntry>,
    chats: DashMap<ChatId, ChatRecord>,
    user_totals: DashMap<UserId, UserTotal>,
    group_totals: DashMap<(ChatId, UserId), GroupTotal>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_key(a: &Item, b: &Item) -> bool {
    a.name.to_lowercase() == b.name.to_lowercase() && a.series.to_lowercase() == b.series.to_lowercase()
}

#[async_trait::async_trait]
impl CatalogRepo for MemoryStore {
    async fn all(&self) -> DbResult<Vec<Item>> {
        Ok(self.items.read().clone())
    }

    async fn get(&self, item_id: ItemId) -> DbResult<Option<Item>> {
        Ok(self.items.read().iter().find(|i| i.id == item_id).cloned())
    }

    async fn insert(&self, item: Item) -> DbResult<Item> {
        let mut items = self.items.write();
        if items.iter().any(|i| i.id == item.id || same_key(i, &item)) {
            return Err(DbError::UniqueViolation);
        }
        items.push(item.clone());
        Ok(item)
    }

    async fn count(&self) -> DbResult<i64> {
        Ok(self.items.read().len() as i64)
    }
}

#[async_trait::async_trait]
impl BalanceRepo for MemoryStore {
    async fn get(&self, user: UserId) -> DbResult<Option<Balance>> {
        Ok(self.balances.get(&user).map(|b| b.value().clone()))
    }

    async fn apply_delta(&self, user: UserId, delta: i64, floor: Option<i64>) -> DbResult<DeltaOutcome> {
        let mut entry = self.balances.entry(user).or_insert_with(|| Balance::empty(user));

        let next = entry
            .amount
            .checked_add(delta)
            .ok_or_else(|| DbError::Validation(format!("balance overflow for user {user}")))?;

        if let Some(floor) = floor {
            if next < floor {
                return Ok(DeltaOutcome::Rejected { current: entry.amount });
            }
        }

        entry.amount = next;
        entry.updated_at = Utc::now();
        Ok(DeltaOutcome::Applied(entry.value().clone()))
    }
}

#[async_trait::async_trait]
impl InventoryRepo for MemoryStore {
    async fn add(&self, user: UserId, item: ItemId, qty: i64) -> DbResult<InventoryEntry> {
        if !self.items.read().iter().any(|i| i.id == item) {
            return Err(DbError::ForeignKey);
        }

        let now = Utc::now();
        let mut entry = self.inventory.entry((user, item)).or_insert_with(|| InventoryEntry {
            user,
            item,
            count: 0,
            first_caught_at: now,
            last_caught_at: now,
        });
        entry.count += qty;
        entry.last_caught_at = now;
        Ok(entry.value().clone())
    }

    async fn remove(&self, user: UserId, item: ItemId, qty: i64) -> DbResult<Option<InventoryEntry>> {
        let remaining = {
            let Some(mut entry) = self.inventory.get_mut(&(user, item)) else {
                return Ok(None);
            };
            entry.count -= qty;
            (entry.count > 0).then(|| entry.value().clone())
        };

        if remaining.is_none() {
            // A concurrent add may have topped it up again in between
            self.inventory.remove_if(&(user, item), |_, e| e.count <= 0);
        }
        Ok(remaining)
    }

    async fn get(&self, user: UserId, item: ItemId) -> DbResult<Option<InventoryEntry>> {
        Ok(self
            .inventory
            .get(&(user, item))
            .filter(|e| e.count > 0)
            .map(|e| e.value().clone()))
    }

    async fn list(&self, user: UserId) -> DbResult<Vec<InventoryEntry>> {
        let mut entries: Vec<InventoryEntry> = self
            .inventory
            .iter()
            .filter(|e| e.user == user && e.count > 0)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by(|a, b| b.last_caught_at.cmp(&a.last_caught_at));
        Ok(entries)
    }
}

#[async_trait::async_trait]
impl ChatRepo for MemoryStore {
    async fn ensure(&self, chat: ChatId, spawn_interval_secs: i64) -> DbResult<ChatRecord> {
        let entry = self
            .chats
            .entry(chat)
            .or_insert_with(|| new_chat(chat, spawn_interval_secs));
        Ok(entry.value().clone())
    }

    async fn touch(&self, chat: ChatId, spawn_interval_secs: i64) -> DbResult<ChatRecord> {
        let mut entry = self
            .chats
            .entry(chat)
            .or_insert_with(|| new_chat(chat, spawn_interval_secs));
        entry.message_count += 1;
        entry.updated_at = Utc::now();
        Ok(entry.value().clone())
    }

    async fn get(&self, chat: ChatId) -> DbResult<Option<ChatRecord>> {
        Ok(self.chats.get(&chat).map(|c| c.value().clone()))
    }

    async fn all(&self) -> DbResult<Vec<ChatRecord>> {
        let mut chats: Vec<ChatRecord> = self.chats.iter().map(|c| c.value().clone()).collect();
        chats.sort_by_key(|c| c.chat);
        Ok(chats)
    }

    async fn mark_spawned(&self, chat: ChatId, at: DateTime<Utc>) -> DbResult<()> {
        let mut entry = self.chats.get_mut(&chat).ok_or(DbError::NotFound)?;
        entry.last_spawn_at = Some(at);
        entry.updated_at = Utc::now();
        Ok(())
    }

    async fn set_interval_all(&self, spawn_interval_secs: i64) -> DbResult<u64> {
        let now = Utc::now();
        let mut n = 0u64;
        for mut entry in self.chats.iter_mut() {
            entry.spawn_interval_secs = spawn_interval_secs;
            entry.updated_at = now;
            n += 1;
        }
        Ok(n)
    }
}

fn new_chat(chat: ChatId, spawn_interval_secs: i64) -> ChatRecord {
    ChatRecord::new(chat, std::time::Duration::from_secs(spawn_interval_secs.max(1) as u64))
}

#[async_trait::async_trait]
impl TotalsRepo for MemoryStore {
    async fn bump_user(&self, user: UserId, display_name: Option<&str>, by: i64) -> DbResult<UserTotal> {
        let now = Utc::now();
        let mut entry = self.user_totals.entry(user).or_insert_with(|| UserTotal {
            user,
            display_name: None,
            total_caught: 0,
            updated_at: now,
        });
        entry.total_caught += by;
        if let Some(name) = display_name {
            entry.display_name = Some(name.to_string());
        }
        entry.updated_at = now;
        Ok(entry.value().clone())
    }

    async fn bump_group(
        &self,
        chat: ChatId,
        user: UserId,
        display_name: Option<&str>,
        by: i64,
    ) -> DbResult<GroupTotal> {
        let now = Utc::now();
        let mut entry = self.group_totals.entry((chat, user)).or_insert_with(|| GroupTotal {
            chat,
            user,
            display_name: None,
            total_caught: 0,
            updated_at: now,
        });
        entry.total_caught += by;
        if let Some(name) = display_name {
            entry.display_name = Some(name.to_string());
        }
        entry.updated_at = now;
        Ok(entry.value().clone())
    }

    async fn top_users(&self, limit: i64) -> DbResult<Vec<UserTotal>> {
        let mut rows: Vec<UserTotal> = self.user_totals.iter().map(|t| t.value().clone()).collect();
        rows.sort_by(|a, b| {
            b.total_caught
                .cmp(&a.total_caught)
                .then(a.updated_at.cmp(&b.updated_at))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn top_in_group(&self, chat: ChatId, limit: i64) -> DbResult<Vec<GroupTotal>> {
        let mut rows: Vec<GroupTotal> = self
            .group_totals
            .iter()
            .filter(|t| t.chat == chat)
            .map(|t| t.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            b.total_caught
                .cmp(&a.total_caught)
                .then(a.updated_at.cmp(&b.updated_at))
        });
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::{NewItem, Rarity};

    fn item(name: &str) -> Item {
        NewItem {
            name: name.into(),
            series: "Evangelion".into(),
            rarity: Rarity::Common,
            media: "file-id".into(),
        }
        .into_item()
    }

    #[tokio::test]
    async fn duplicate_items_are_rejected_case_insensitively() {
        let store = MemoryStore::new();
        store.insert(item("Asuka Langley")).await.unwrap();
        let err = store.insert(item("asuka langley")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation));
        assert_eq!(CatalogRepo::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delta_respects_floor() {
        let store = MemoryStore::new();
        let user = UserId(7);

        let out = store.apply_delta(user, 50, Some(0)).await.unwrap();
        assert!(matches!(out, DeltaOutcome::Applied(ref b) if b.amount == 50));

        let out = store.apply_delta(user, -80, Some(0)).await.unwrap();
        assert_eq!(out, DeltaOutcome::Rejected { current: 50 });

        let out = store.apply_delta(user, -80, None).await.unwrap();
        assert!(matches!(out, DeltaOutcome::Applied(ref b) if b.amount == -30));
    }

    #[tokio::test]
    async fn inventory_add_and_remove() {
        let store = MemoryStore::new();
        let asuka = store.insert(item("Asuka Langley")).await.unwrap();
        let user = UserId(1);

        store.add(user, asuka.id, 1).await.unwrap();
        let entry = store.add(user, asuka.id, 2).await.unwrap();
        assert_eq!(entry.count, 3);

        let left = store.remove(user, asuka.id, 1).await.unwrap();
        assert_eq!(left.map(|e| e.count), Some(2));

        let left = store.remove(user, asuka.id, 2).await.unwrap();
        assert!(left.is_none());
        assert!(InventoryRepo::get(&store, user, asuka.id).await.unwrap().is_none());
        assert!(store.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inventory_rejects_unknown_items() {
        let store = MemoryStore::new();
        let err = store.add(UserId(1), ItemId::new(), 1).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKey));
    }

    #[tokio::test]
    async fn set_interval_rewrites_every_chat() {
        let store = MemoryStore::new();
        store.ensure(ChatId(-1), 3600).await.unwrap();
        store.touch(ChatId(-2), 3600).await.unwrap();

        assert_eq!(store.set_interval_all(600).await.unwrap(), 2);
        for chat in ChatRepo::all(&store).await.unwrap() {
            assert_eq!(chat.spawn_interval_secs, 600);
        }
    }

    #[tokio::test]
    async fn leaderboard_orders_by_total() {
        let store = MemoryStore::new();
        store.bump_user(UserId(1), Some("rei"), 1).await.unwrap();
        store.bump_user(UserId(2), Some("asuka"), 3).await.unwrap();
        store.bump_user(UserId(1), None, 1).await.unwrap();

        let top = store.top_users(10).await.unwrap();
        assert_eq!(top[0].user, UserId(2));
        assert_eq!(top[1].total_caught, 2);
        assert_eq!(top[1].display_name.as_deref(), Some("rei"));
    }
}

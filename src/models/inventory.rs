use crate::models::item::Item;
use crate::models::types::{ItemId, UserId};
use chrono::{DateTime, Utc};

/// How many copies of one catalog item a user has caught.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub user: UserId,
    pub item: ItemId,
    /// Always >= 1; an entry with nothing left is removed
    pub count: i64,
    pub first_caught_at: DateTime<Utc>,
    pub last_caught_at: DateTime<Utc>,
}

/// Inventory entry joined with its catalog item, for listing.
#[derive(Debug, Clone)]
pub struct Holding {
    pub item: Item,
    pub count: i64,
    pub last_caught_at: DateTime<Utc>,
}

impl Holding {
    pub fn display_text(&self) -> String {
        if self.count > 1 {
            format!("{} ({}) x{}", self.item.name, self.item.series, self.count)
        } else {
            format!("{} ({})", self.item.name, self.item.series)
        }
    }
}

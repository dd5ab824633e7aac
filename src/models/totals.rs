use crate::models::types::{ChatId, UserId};
use chrono::{DateTime, Utc};

/// Global leaderboard row. Derived from inventory, never authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTotal {
    pub user: UserId,
    pub display_name: Option<String>,
    pub total_caught: i64,
    pub updated_at: DateTime<Utc>,
}

/// Per-chat leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTotal {
    pub chat: ChatId,
    pub user: UserId,
    pub display_name: Option<String>,
    pub total_caught: i64,
    pub updated_at: DateTime<Utc>,
}

use crate::models::types::UserId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub user: UserId,
    /// Sum of every delta ever applied for this user
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    pub fn empty(user: UserId) -> Self {
        let now = Utc::now();
        Self {
            user,
            amount: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of an atomic "apply delta unless it breaks the floor" operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaOutcome {
    Applied(Balance),
    /// Nothing was written; `current` is the balance that was seen
    Rejected { current: i64 },
}

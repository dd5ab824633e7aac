use crate::models::types::ChatId;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A chat the bot has seen traffic in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRecord {
    pub chat: ChatId,
    pub spawn_interval_secs: i64,
    pub last_spawn_at: Option<DateTime<Utc>>,
    pub message_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatRecord {
    pub fn new(chat: ChatId, spawn_interval: Duration) -> Self {
        let now = Utc::now();
        Self {
            chat,
            spawn_interval_secs: i64::try_from(spawn_interval.as_secs()).unwrap_or(i64::MAX),
            last_spawn_at: None,
            message_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn spawn_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.spawn_interval_secs.max(1))
    }

    /// A chat that never had a spawn is always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_spawn_at {
            None => true,
            Some(last) => now - last >= self.spawn_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_after_interval() {
        let mut rec = ChatRecord::new(ChatId(1001), Duration::from_secs(3600));
        let now = Utc::now();
        assert!(rec.is_due(now));

        rec.last_spawn_at = Some(now - chrono::Duration::minutes(30));
        assert!(!rec.is_due(now));

        rec.last_spawn_at = Some(now - chrono::Duration::minutes(61));
        assert!(rec.is_due(now));
    }
}

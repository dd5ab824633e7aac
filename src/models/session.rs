use crate::models::item::Item;
use crate::models::types::{ChatId, SessionId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for someone to name the item
    Open,
    /// Someone named it first
    Resolved,
    /// Nobody named it in time (or the announcement never went out)
    Expired,
}

/// One spawn in one chat, from announcement until it is caught or times out.
#[derive(Debug, Clone)]
pub struct SpawnSession {
    pub id: SessionId,
    pub chat: ChatId,
    pub item: Item,
    pub created_at: DateTime<Utc>,
    pub state: SessionState,
    /// Only set when `state == Resolved`
    pub winner: Option<UserId>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl SpawnSession {
    pub fn open(chat: ChatId, item: Item) -> Self {
        Self {
            id: SessionId::new(),
            chat,
            item,
            created_at: Utc::now(),
            state: SessionState::Open,
            winner: None,
            closed_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Age of the session at `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }

    pub(crate) fn resolve(&mut self, winner: UserId) {
        self.state = SessionState::Resolved;
        self.winner = Some(winner);
        self.closed_at = Some(Utc::now());
    }

    pub(crate) fn expire(&mut self) {
        self.state = SessionState::Expired;
        self.closed_at = Some(Utc::now());
    }
}

use crate::config::SettingsHandle;
use crate::error::{AppResult, DomainError};
use crate::models::item::Item;
use crate::models::session::SpawnSession;
use crate::models::types::{ChatId, SessionId, UserId};
use crate::services::catalog::resolve_by_name;
use crate::services::{InventoryService, LedgerService};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard, oneshot};
use tokio::task::JoinSet;

/// Per-chat state. The mutex around it is what serializes open, claim and
/// expire for one chat.
#[derive(Debug, Default)]
struct ChatSlot {
    /// Most recent session; only meaningful while it is `Open`
    current: Option<SpawnSession>,
}

impl ChatSlot {
    fn open_session(&mut self) -> Option<&mut SpawnSession> {
        self.current.as_mut().filter(|s| s.is_open())
    }
}

/// Everything the winner announcement needs.
#[derive(Debug, Clone)]
pub struct WinReceipt {
    pub session: SessionId,
    pub chat: ChatId,
    pub item: Item,
    pub user: UserId,
    pub user_name: Option<String>,
    pub reward: i64,
    /// Balance after the reward
    pub balance: i64,
    /// Copies of this item the winner now owns
    pub count: i64,
}

#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    Won(WinReceipt),
    /// There is a spawn, but this was not its name
    Miss,
    NoActiveSpawn,
}

#[derive(Debug, Clone)]
pub enum ExpireOutcome {
    /// This call closed the session
    Expired(SpawnSession),
    /// Already resolved, expired, or replaced
    NotOpen,
}

impl ExpireOutcome {
    pub fn is_expired(&self) -> bool {
        matches!(self, ExpireOutcome::Expired(_))
    }
}

pub struct SessionManager {
    slots: DashMap<ChatId, Arc<Mutex<ChatSlot>>>,
    inventory: Arc<InventoryService>,
    ledger: Arc<LedgerService>,
    settings: SettingsHandle,
    /// Reward sequences that have started. Never aborted.
    rewards: parking_lot::Mutex<JoinSet<()>>,
}

impl SessionManager {
    pub fn new(inventory: Arc<InventoryService>, ledger: Arc<LedgerService>, settings: SettingsHandle) -> Self {
        Self {
            slots: DashMap::new(),
            inventory,
            ledger,
            settings,
            rewards: parking_lot::Mutex::new(JoinSet::new()),
        }
    }

    fn slot(&self, chat: ChatId) -> Arc<Mutex<ChatSlot>> {
        self.slots.entry(chat).or_default().value().clone()
    }

    pub async fn open(&self, chat: ChatId, item: Item) -> AppResult<SpawnSession> {
        let slot = self.slot(chat);
        let mut guard = slot.lock().await;

        if guard.open_session().is_some() {
            return Err(DomainError::AlreadyOpen(chat));
        }

        let session = SpawnSession::open(chat, item);
        tracing::info!(chat = %chat, session = %session.id, item = %session.item.name, rarity = %session.item.rarity, "spawn opened");
        guard.current = Some(session.clone());
        Ok(session)
    }

    /// Checks `text` against the open spawn of `chat` and rewards the first match.
    ///
    /// The reward runs on its own task holding the chat lock, so it completes
    /// even if the caller goes away. If the reward fails the session stays open
    /// and the error is returned.
    pub async fn claim(
        &self,
        chat: ChatId,
        user: UserId,
        user_name: Option<&str>,
        text: &str,
    ) -> AppResult<ClaimOutcome> {
        let guard = self.slot(chat).lock_owned().await;

        let Some(session) = guard.current.as_ref().filter(|s| s.is_open()) else {
            return Ok(ClaimOutcome::NoActiveSpawn);
        };
        if resolve_by_name(text, std::slice::from_ref(&session.item)).is_none() {
            return Ok(ClaimOutcome::Miss);
        }

        let inventory = self.inventory.clone();
        let ledger = self.ledger.clone();
        let reward = self.settings.snapshot().catch_reward;
        let user_name = user_name.map(str::to_string);

        let (tx, rx) = oneshot::channel();
        {
            let mut rewards = self.rewards.lock();
            while let Some(res) = rewards.try_join_next() {
                log_reward_join(res);
            }
            rewards.spawn(async move {
                let res = apply_reward(guard, inventory, ledger, user, user_name, reward).await;
                let _ = tx.send(res);
            });
        }

        rx.await
            .map_err(|_| DomainError::InternalError("reward task ended without a result".into()))?
    }

    /// Waits for every reward sequence that has already started. Called on
    /// shutdown once no new claims can come in.
    pub async fn finish_rewards(&self) {
        let mut pending = std::mem::take(&mut *self.rewards.lock());
        if pending.is_empty() {
            return;
        }

        tracing::info!(pending = pending.len(), "waiting for in-flight rewards");
        while let Some(res) = pending.join_next().await {
            log_reward_join(res);
        }
    }

    /// Expires whatever session is open in `chat`.
    pub async fn expire(&self, chat: ChatId) -> ExpireOutcome {
        let slot = self.slot(chat);
        let mut guard = slot.lock().await;
        close(&mut guard, None)
    }

    /// Expires `session` if it is still the open one. Calling this twice, or
    /// after a win, is a no-op.
    pub async fn expire_session(&self, chat: ChatId, session: SessionId) -> ExpireOutcome {
        let slot = self.slot(chat);
        let mut guard = slot.lock().await;
        let outcome = close(&mut guard, Some(session));
        if outcome.is_expired() {
            tracing::info!(chat = %chat, session = %session, "spawn expired");
        }
        outcome
    }

    /// Closes a session whose announcement never made it to the chat.
    pub async fn abandon(&self, chat: ChatId, session: SessionId) -> ExpireOutcome {
        let slot = self.slot(chat);
        let mut guard = slot.lock().await;
        let outcome = close(&mut guard, Some(session));
        if outcome.is_expired() {
            tracing::warn!(chat = %chat, session = %session, "spawn abandoned");
        }
        outcome
    }

    pub async fn active(&self, chat: ChatId) -> Option<SpawnSession> {
        let slot = self.slots.get(&chat).map(|s| s.value().clone())?;
        let guard = slot.lock().await;
        guard.current.clone().filter(|s| s.is_open())
    }

    pub async fn is_open(&self, chat: ChatId) -> bool {
        self.active(chat).await.is_some()
    }

    /// Sessions that have been open for longer than `timeout`. Chats that are
    /// busy right now are skipped; the next sweep will see them.
    pub fn overdue(&self, timeout: Duration) -> Vec<(ChatId, SessionId)> {
        let limit = chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX);
        let now = Utc::now();

        let slots: Vec<Arc<Mutex<ChatSlot>>> = self.slots.iter().map(|s| s.value().clone()).collect();
        slots
            .iter()
            .filter_map(|slot| {
                let guard = slot.try_lock().ok()?;
                let session = guard.current.as_ref().filter(|s| s.is_open())?;
                (session.age(now) >= limit).then_some((session.chat, session.id))
            })
            .collect()
    }
}

fn log_reward_join(res: Result<(), tokio::task::JoinError>) {
    if let Err(e) = res {
        tracing::error!(error = %e, "reward task failed");
    }
}

fn close(slot: &mut ChatSlot, expected: Option<SessionId>) -> ExpireOutcome {
    match slot.open_session() {
        Some(session) if expected.is_none_or(|id| id == session.id) => {
            session.expire();
            ExpireOutcome::Expired(session.clone())
        }
        _ => ExpireOutcome::NotOpen,
    }
}

async fn apply_reward(
    mut guard: OwnedMutexGuard<ChatSlot>,
    inventory: Arc<InventoryService>,
    ledger: Arc<LedgerService>,
    user: UserId,
    user_name: Option<String>,
    reward: i64,
) -> AppResult<ClaimOutcome> {
    let Some(session) = guard.open_session() else {
        return Ok(ClaimOutcome::NoActiveSpawn);
    };
    let chat = session.chat;
    let item = session.item.clone();

    // Inventory first: it can be undone without anyone noticing, a credit can't.
    let entry = inventory.add(user, item.id, 1).await?;
    let balance = match ledger.credit(user, reward).await {
        Ok(balance) => balance,
        Err(e) => {
            tracing::warn!(chat = %chat, user = %user, error = %e, "reward credit failed, reverting inventory");
            if let Err(undo) = inventory.revert(user, item.id, 1).await {
                tracing::error!(chat = %chat, user = %user, item = %item.id, error = %undo, "failed to revert inventory after failed credit");
            }
            return Err(e);
        }
    };

    session.resolve(user);
    let receipt = WinReceipt {
        session: session.id,
        chat,
        item,
        user,
        user_name,
        reward,
        balance: balance.amount,
        count: entry.count,
    };
    drop(guard);

    tracing::info!(chat = %chat, user = %user, item = %receipt.item.name, session = %receipt.session, "spawn caught");
    inventory
        .record_catch(chat, user, receipt.user_name.as_deref())
        .await;

    Ok(ClaimOutcome::Won(receipt))
}

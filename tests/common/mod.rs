#![allow(dead_code)]

use async_trait::async_trait;
use catchbot::config::{Config, GameSettings, StoreKind, TelegramConfig};
use catchbot::db::DbResult;
use catchbot::db::error::DbError;
use catchbot::db::repo::{BalanceRepo, MemoryStore};
use catchbot::models::balance::{Balance, DeltaOutcome};
use catchbot::models::item::{Item, NewItem, Rarity};
use catchbot::models::types::{ChatId, MessageId, UserId};
use catchbot::net::{ChatClient, ChatKind, InboundEvent, PlatformError};
use catchbot::util::retry::RetryPolicy;
use catchbot::{Registry, Repos};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

pub const GROUP: ChatId = ChatId(1001);
pub const ADMIN: UserId = UserId(1);
pub const ALICE: UserId = UserId(100);
pub const BOB: UserId = UserId(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { chat: ChatId, text: String },
    Media { chat: ChatId, media: String, caption: String },
    Reply { chat: ChatId, reply_to: MessageId, text: String },
}

/// Chat client that remembers everything it was asked to send.
#[derive(Default)]
pub struct RecordingClient {
    sent: Mutex<Vec<Sent>>,
    fail_media: AtomicBool,
}

impl RecordingClient {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn media_count(&self, chat: ChatId) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|s| matches!(s, Sent::Media { chat: c, .. } if *c == chat))
            .count()
    }

    /// Plain texts and replies sent to `chat`, in order
    pub fn texts(&self, chat: ChatId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Text { chat: c, text } | Sent::Reply { chat: c, text, .. } if *c == chat => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self, chat: ChatId) -> Option<String> {
        self.texts(chat).pop()
    }

    pub fn set_fail_media(&self, fail: bool) {
        self.fail_media.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatClient for RecordingClient {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), PlatformError> {
        self.sent.lock().push(Sent::Text {
            chat,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn send_media(&self, chat: ChatId, media: &str, caption: &str) -> Result<(), PlatformError> {
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(PlatformError::Rejected("photo rejected".into()));
        }
        self.sent.lock().push(Sent::Media {
            chat,
            media: media.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn reply_text(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<(), PlatformError> {
        self.sent.lock().push(Sent::Reply {
            chat,
            reply_to,
            text: text.to_string(),
        });
        Ok(())
    }
}

/// Balance repo that fails the next `failures` writes with a transient error.
pub struct FlakyBalance {
    pub inner: Arc<MemoryStore>,
    pub failures: AtomicU32,
    pub attempts: AtomicI64,
}

impl FlakyBalance {
    pub fn new(inner: Arc<MemoryStore>, failures: u32) -> Self {
        Self {
            inner,
            failures: AtomicU32::new(failures),
            attempts: AtomicI64::new(0),
        }
    }
}

#[async_trait]
impl BalanceRepo for FlakyBalance {
    async fn get(&self, user: UserId) -> DbResult<Option<Balance>> {
        BalanceRepo::get(&*self.inner, user).await
    }

    async fn apply_delta(&self, user: UserId, delta: i64, floor: Option<i64>) -> DbResult<DeltaOutcome> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DbError::Unavailable("injected failure".into()));
        }
        self.inner.apply_delta(user, delta, floor).await
    }
}

/// Balance repo whose writes wait until `release` is called.
pub struct GatedBalance {
    pub inner: Arc<MemoryStore>,
    gate: Semaphore,
    entered: AtomicBool,
}

impl GatedBalance {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            gate: Semaphore::new(0),
            entered: AtomicBool::new(false),
        }
    }

    /// True once a write is waiting at the gate
    pub fn entered(&self) -> bool {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn release(&self) {
        self.gate.add_permits(1000);
    }
}

#[async_trait]
impl BalanceRepo for GatedBalance {
    async fn get(&self, user: UserId) -> DbResult<Option<Balance>> {
        BalanceRepo::get(&*self.inner, user).await
    }

    async fn apply_delta(&self, user: UserId, delta: i64, floor: Option<i64>) -> DbResult<DeltaOutcome> {
        self.entered.store(true, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| DbError::Unavailable("gate closed".into()))?;
        self.inner.apply_delta(user, delta, floor).await
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        base: Duration::from_millis(1),
        max: Duration::from_millis(5),
    }
}

pub fn game_settings() -> GameSettings {
    GameSettings {
        admins: vec![ADMIN],
        ..GameSettings::default()
    }
}

pub fn test_config(game: GameSettings) -> Config {
    Config {
        store: StoreKind::Memory,
        telegram: TelegramConfig {
            bot_username: Some("catch_bot".into()),
            ..TelegramConfig::default()
        },
        shutdown_grace_secs: 1,
        game,
        ..Config::default()
    }
}

pub struct Harness {
    pub registry: Arc<Registry>,
    pub store: Arc<MemoryStore>,
    pub client: Arc<RecordingClient>,
}

pub fn harness(game: GameSettings) -> Harness {
    let store = Arc::new(MemoryStore::new());
    harness_with(game, store.clone(), Repos::from_store(store), fast_retry())
}

pub fn harness_with(game: GameSettings, store: Arc<MemoryStore>, repos: Repos, retry: RetryPolicy) -> Harness {
    let client = Arc::new(RecordingClient::default());
    let registry = Arc::new(Registry::with_retry(
        Arc::new(test_config(game)),
        repos,
        client.clone(),
        retry,
    ));
    Harness {
        registry,
        store,
        client,
    }
}

pub async fn add_item(registry: &Registry, name: &str, rarity: Rarity) -> Item {
    registry
        .services
        .catalog
        .upload(NewItem {
            name: name.into(),
            series: "Evangelion".into(),
            rarity,
            media: format!("https://files.example/{}.jpg", name.to_lowercase().replace(' ', "_")),
        })
        .await
        .unwrap()
}

pub fn group_msg(user: UserId, name: &str, text: &str) -> InboundEvent {
    static NEXT_ID: AtomicI64 = AtomicI64::new(1);
    InboundEvent {
        chat: GROUP,
        chat_kind: ChatKind::Group,
        user,
        user_name: Some(name.to_string()),
        text: text.to_string(),
        message_id: MessageId(NEXT_ID.fetch_add(1, Ordering::SeqCst)),
        timestamp: chrono::Utc::now(),
    }
}

/// Polls `cond` every 20ms until it holds or `timeout` passes.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

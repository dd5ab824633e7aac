use crate::models::types::{ChatId, MessageId, UserId};
use crate::util::retry::{RetryPolicy, Transient};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

pub mod telegram;

#[derive(Debug, Error)]
pub enum PlatformError {
    /// Network trouble, rate limiting, 5xx. Worth another try.
    #[error("platform unavailable: {0}")]
    Unavailable(String),

    /// The platform refused the request (bad chat, blocked bot, malformed media)
    #[error("platform rejected request: {0}")]
    Rejected(String),
}

impl Transient for PlatformError {
    fn is_transient(&self) -> bool {
        matches!(self, PlatformError::Unavailable(_))
    }
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        let server_side = e
            .status()
            .is_some_and(|s| s.is_server_error() || s.as_u16() == 429);
        if e.is_timeout() || e.is_connect() || e.is_request() || server_side {
            PlatformError::Unavailable(e.to_string())
        } else {
            PlatformError::Rejected(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Channel,
}

impl ChatKind {
    pub fn is_group(&self) -> bool {
        matches!(self, ChatKind::Group)
    }
}

/// One message as delivered by the chat platform.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub chat: ChatId,
    pub chat_kind: ChatKind,
    pub user: UserId,
    /// First name or username, whatever the platform gave us
    pub user_name: Option<String>,
    pub text: String,
    pub message_id: MessageId,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), PlatformError>;

    /// Send an image (URL or platform file id) with a caption.
    async fn send_media(&self, chat: ChatId, media: &str, caption: &str) -> Result<(), PlatformError>;

    async fn reply_text(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<(), PlatformError> {
        let _ = reply_to;
        self.send_text(chat, text).await
    }
}

/// Wraps a client so every send is retried on transient failures.
pub struct RetryingClient {
    inner: Arc<dyn ChatClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn ChatClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl ChatClient for RetryingClient {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), PlatformError> {
        self.policy.run("send_text", || self.inner.send_text(chat, text)).await
    }

    async fn send_media(&self, chat: ChatId, media: &str, caption: &str) -> Result<(), PlatformError> {
        self.policy
            .run("send_media", || self.inner.send_media(chat, media, caption))
            .await
    }

    async fn reply_text(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<(), PlatformError> {
        self.policy
            .run("reply_text", || self.inner.reply_text(chat, reply_to, text))
            .await
    }
}

//! Telegram Bot API adapter: long polling for inbound messages, plain
//! `sendMessage` / `sendPhoto` for outbound ones.

use crate::models::types::{ChatId, MessageId, UserId};
use crate::net::{ChatClient, ChatKind, InboundEvent, PlatformError};
use crate::util::retry::RetryPolicy;
use crate::util::shutdown::{ShutdownSignal, wait_for_shutdown};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct TelegramClient {
    http: reqwest::Client,
    /// `{api_base}/bot{token}`
    endpoint: String,
    poll_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    from: Option<User>,
    chat: Chat,
    date: i64,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    first_name: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
}

impl Update {
    /// Only text messages from real users turn into events.
    fn into_event(self) -> Option<InboundEvent> {
        let msg = self.message?;
        let from = msg.from?;
        let text = msg.text?;

        let chat_kind = match msg.chat.kind.as_str() {
            "private" => ChatKind::Private,
            "group" | "supergroup" => ChatKind::Group,
            _ => ChatKind::Channel,
        };

        Some(InboundEvent {
            chat: ChatId(msg.chat.id),
            chat_kind,
            user: UserId(from.id),
            user_name: from.first_name.or(from.username),
            text,
            message_id: MessageId(msg.message_id),
            timestamp: DateTime::<Utc>::from_timestamp(msg.date, 0).unwrap_or_else(Utc::now),
        })
    }
}

impl TelegramClient {
    pub fn new(token: &str, api_base: &str, poll_timeout: Duration) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            // Long polls hold the request open for `poll_timeout`
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .map_err(|e| PlatformError::Rejected(format!("http client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
            poll_timeout,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T, PlatformError> {
        let resp = self
            .http
            .post(format!("{}/{}", self.endpoint, method))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let envelope: Envelope<T> = resp.json().await?;

        if envelope.ok {
            if let Some(result) = envelope.result {
                return Ok(result);
            }
        }

        let code = envelope.error_code.unwrap_or(status.as_u16());
        let description = envelope.description.unwrap_or_else(|| status.to_string());
        if code == 429 || code >= 500 {
            Err(PlatformError::Unavailable(format!("{method}: {code} {description}")))
        } else {
            Err(PlatformError::Rejected(format!("{method}: {code} {description}")))
        }
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, PlatformError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": self.poll_timeout.as_secs(),
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Long-polls until shutdown, forwarding every usable message to `tx`.
    pub async fn poll(&self, tx: mpsc::Sender<InboundEvent>, shutdown: ShutdownSignal) {
        let backoff = RetryPolicy {
            attempts: u32::MAX,
            base: Duration::from_secs(1),
            max: Duration::from_secs(30),
        };
        let mut offset = 0i64;
        let mut failures = 0u32;

        tracing::info!("telegram polling started");
        loop {
            let res = tokio::select! {
                _ = wait_for_shutdown(shutdown.clone()) => break,
                res = self.get_updates(offset) => res,
            };

            match res {
                Ok(updates) => {
                    failures = 0;
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(event) = update.into_event() else {
                            continue;
                        };
                        if tx.send(event).await.is_err() {
                            tracing::debug!("event receiver gone, stopping poll loop");
                            return;
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    let delay = backoff.backoff_delay(failures);
                    tracing::warn!(error = %e, failures, ?delay, "getUpdates failed");
                    tokio::select! {
                        _ = wait_for_shutdown(shutdown.clone()) => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
        tracing::info!("telegram polling stopped");
    }
}

#[async_trait]
impl ChatClient for TelegramClient {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), PlatformError> {
        let _: serde_json::Value = self
            .call("sendMessage", json!({ "chat_id": chat.0, "text": text }))
            .await?;
        Ok(())
    }

    async fn send_media(&self, chat: ChatId, media: &str, caption: &str) -> Result<(), PlatformError> {
        let _: serde_json::Value = self
            .call(
                "sendPhoto",
                json!({ "chat_id": chat.0, "photo": media, "caption": caption }),
            )
            .await?;
        Ok(())
    }

    async fn reply_text(&self, chat: ChatId, reply_to: MessageId, text: &str) -> Result<(), PlatformError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat.0,
                    "text": text,
                    "reply_parameters": { "message_id": reply_to.0, "allow_sending_without_reply": true },
                }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_text_message_becomes_event() {
        let raw = r#"{
            "update_id": 10,
            "message": {
                "message_id": 77,
                "from": { "id": 5, "first_name": "Shinji", "username": "ikari" },
                "chat": { "id": -100123, "type": "supergroup" },
                "date": 1700000000,
                "text": "asuka"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let event = update.into_event().unwrap();

        assert_eq!(event.chat, ChatId(-100123));
        assert_eq!(event.chat_kind, ChatKind::Group);
        assert_eq!(event.user, UserId(5));
        assert_eq!(event.user_name.as_deref(), Some("Shinji"));
        assert_eq!(event.message_id, MessageId(77));
        assert_eq!(event.text, "asuka");
    }

    #[test]
    fn photo_without_text_is_skipped() {
        let raw = r#"{
            "update_id": 11,
            "message": {
                "message_id": 78,
                "from": { "id": 5 },
                "chat": { "id": 5, "type": "private" },
                "date": 1700000000
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        assert!(update.into_event().is_none());
    }
}

use crate::commands::{CmdCtx, process_command};
use crate::game::scheduler::SchedulerHandle;
use crate::game::{drain, log_join, messages};
use crate::input::parser::{Intent, parse_intent};
use crate::net::InboundEvent;
use crate::services::ClaimOutcome;
use crate::state::registry::Registry;
use crate::util::retry::Transient;
use crate::util::shutdown::{ShutdownSignal, wait_for_shutdown};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Fans inbound messages out to one task each.
pub struct Dispatcher {
    registry: Arc<Registry>,
    scheduler: SchedulerHandle,
    tasks: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, scheduler: SchedulerHandle) -> Self {
        Self {
            registry,
            scheduler,
            tasks: JoinSet::new(),
        }
    }

    pub async fn run(mut self, mut rx: mpsc::Receiver<InboundEvent>, shutdown: ShutdownSignal) {
        tracing::info!("dispatcher started");
        loop {
            tokio::select! {
                _ = wait_for_shutdown(shutdown.clone()) => break,
                event = rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    let registry = self.registry.clone();
                    let scheduler = self.scheduler.clone();
                    self.tasks.spawn(async move {
                        handle_event(registry, scheduler, event).await;
                    });
                }
                Some(res) = self.tasks.join_next(), if !self.tasks.is_empty() => log_join(res, "dispatcher"),
            }
        }

        tracing::info!("dispatcher stopping");
        drain(&mut self.tasks, self.registry.config.shutdown_grace(), "dispatcher").await;
    }
}

/// Everything that happens for one inbound message.
pub async fn handle_event(registry: Arc<Registry>, scheduler: SchedulerHandle, event: InboundEvent) {
    let chat = event.chat;

    if event.chat_kind.is_group() {
        let interval = i64::try_from(registry.settings.snapshot().spawn_interval_secs).unwrap_or(i64::MAX);
        if let Err(e) = registry.repos.chat.touch(chat, interval).await {
            tracing::warn!(chat = %chat, error = %e, "could not register chat");
        }
    }

    let bot_username = registry.config.telegram.bot_username.as_deref();
    match parse_intent(&event.text, bot_username) {
        Intent::Ignored => {}
        Intent::Text(text) => {
            if event.chat_kind.is_group() {
                free_text_claim(&registry, &event, &text).await;
            }
        }
        Intent::Command(cmd) => {
            let verb = cmd.verb.as_str().to_string();
            let message_id = event.message_id;
            let ctx = Arc::new(CmdCtx {
                registry: registry.clone(),
                scheduler,
                event,
            });

            if let Err(e) = process_command(cmd, ctx).await {
                if e.is_transient() {
                    tracing::warn!(chat = %chat, command = %verb, error = %e, "command failed");
                } else {
                    tracing::debug!(chat = %chat, command = %verb, error = %e, "command rejected");
                }
                if let Err(send_err) = registry.client.reply_text(chat, message_id, &e.user_message()).await {
                    tracing::warn!(chat = %chat, error = %send_err, "could not send error reply");
                }
            }
        }
    }
}

/// Plain messages are guesses. Only a win, or a claim that failed on a
/// transient error, is answered.
async fn free_text_claim(registry: &Registry, event: &InboundEvent, text: &str) {
    let outcome = registry
        .services
        .sessions
        .claim(event.chat, event.user, event.user_name.as_deref(), text)
        .await;

    match outcome {
        Ok(ClaimOutcome::Won(receipt)) => {
            if let Err(e) = registry
                .client
                .reply_text(event.chat, event.message_id, &messages::winner(&receipt))
                .await
            {
                tracing::warn!(chat = %event.chat, error = %e, "could not announce winner");
            }
        }
        Ok(ClaimOutcome::Miss) | Ok(ClaimOutcome::NoActiveSpawn) => {}
        Err(e) => {
            tracing::warn!(chat = %event.chat, user = %event.user, error = %e, "claim failed");
            if e.is_transient() {
                if let Err(send_err) = registry
                    .client
                    .reply_text(event.chat, event.message_id, messages::try_again())
                    .await
                {
                    tracing::warn!(chat = %event.chat, error = %send_err, "could not send error reply");
                }
            }
        }
    }
}

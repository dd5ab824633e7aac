use crate::error::{AppResult, DomainError};
use crate::game::{drain, log_join, messages};
use crate::models::chat::ChatRecord;
use crate::models::item::Item;
use crate::models::session::SpawnSession;
use crate::models::types::{ChatId, SessionId};
use crate::services::{ExpireOutcome, pick_from};
use crate::state::registry::Registry;
use crate::util::shutdown::{ShutdownSignal, wait_for_shutdown};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

pub enum SchedulerCommand {
    /// Spawn in `chat` right away. `None` picks a random item.
    SpawnNow {
        chat: ChatId,
        item: Option<Item>,
        reply: oneshot::Sender<AppResult<SpawnSession>>,
    },
}

#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// Opens a spawn now, skipping the interval check. Still refuses when the
    /// chat already has an open spawn.
    pub async fn spawn_now(&self, chat: ChatId, item: Option<Item>) -> AppResult<SpawnSession> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SchedulerCommand::SpawnNow { chat, item, reply })
            .await
            .map_err(|_| DomainError::InternalError("scheduler is not running".into()))?;
        rx.await
            .map_err(|_| DomainError::InternalError("scheduler dropped the request".into()))?
    }
}

pub struct SpawnScheduler {
    registry: Arc<Registry>,
    rx: mpsc::Receiver<SchedulerCommand>,
    tasks: JoinSet<()>,
    shutdown: ShutdownSignal,
}

impl SpawnScheduler {
    pub fn new(registry: Arc<Registry>, shutdown: ShutdownSignal) -> (Self, SchedulerHandle) {
        let (tx, rx) = mpsc::channel(32);
        let scheduler = Self {
            registry,
            rx,
            tasks: JoinSet::new(),
            shutdown,
        };
        (scheduler, SchedulerHandle { tx })
    }

    pub async fn run(mut self) {
        let mut period = self.registry.settings.snapshot().tick();
        let mut ticker = new_ticker(period);
        tracing::info!(?period, "spawn scheduler started");

        loop {
            tokio::select! {
                _ = wait_for_shutdown(self.shutdown.clone()) => break,
                _ = ticker.tick() => {
                    self.tick().await;

                    let next = self.registry.settings.snapshot().tick();
                    if next != period {
                        tracing::info!(?next, "tick period changed");
                        period = next;
                        ticker = new_ticker(period);
                        // the first tick of a fresh interval fires immediately
                        ticker.reset();
                    }
                }
                Some(cmd) = self.rx.recv() => self.handle(cmd).await,
                Some(res) = self.tasks.join_next(), if !self.tasks.is_empty() => log_join(res, "scheduler"),
            }
        }

        tracing::info!("spawn scheduler stopping");
        drain(&mut self.tasks, self.registry.config.shutdown_grace(), "scheduler").await;
    }

    async fn handle(&mut self, cmd: SchedulerCommand) {
        match cmd {
            SchedulerCommand::SpawnNow { chat, item, reply } => {
                let item = match item {
                    Some(item) => item,
                    None => match self.registry.services.catalog.pick_weighted().await {
                        Ok(item) => item,
                        Err(e) => {
                            let _ = reply.send(Err(e));
                            return;
                        }
                    },
                };
                self.launch(chat, item, Some(reply));
            }
        }
    }

    /// One scheduling pass. Returns how many spawns were launched.
    pub async fn tick(&mut self) -> usize {
        let settings = self.registry.settings.snapshot();
        let sessions = self.registry.services.sessions.clone();

        for (chat, session) in sessions.overdue(settings.claim_timeout()) {
            let registry = self.registry.clone();
            self.tasks.spawn(async move {
                expire_and_announce(&registry, chat, session).await;
            });
        }

        let chats = match self
            .registry
            .retry
            .run("chat.all", || self.registry.repos.chat.all())
            .await
        {
            Ok(chats) => chats,
            Err(e) => {
                tracing::error!(error = %e, "could not list chats, skipping tick");
                return 0;
            }
        };

        let now = Utc::now();
        let mut due: Vec<ChatRecord> = Vec::new();
        for chat in chats {
            if !settings.chat_allowed(chat.chat) {
                continue;
            }
            if !chat.is_due(now) {
                continue;
            }
            if sessions.is_open(chat.chat).await {
                tracing::debug!(chat = %chat.chat, "spawn still open, skipping");
                continue;
            }
            due.push(chat);
        }
        if due.is_empty() {
            return 0;
        }

        let items = match self.registry.services.catalog.all().await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %e, "could not load catalog, skipping tick");
                return 0;
            }
        };

        let mut launched = 0;
        for chat in due {
            let item = match pick_from(&items, &settings.rarity_weights, &mut rand::rng()) {
                Ok(item) => item.clone(),
                Err(DomainError::EmptyCatalog) => {
                    tracing::error!("catalog is empty, nothing to spawn; upload items with /upload");
                    return launched;
                }
                Err(e) => {
                    tracing::error!(error = %e, "item selection failed");
                    return launched;
                }
            };
            self.launch(chat.chat, item, None);
            launched += 1;
        }
        launched
    }

    fn launch(&mut self, chat: ChatId, item: Item, reply: Option<oneshot::Sender<AppResult<SpawnSession>>>) {
        let registry = self.registry.clone();
        let shutdown = self.shutdown.clone();
        self.tasks.spawn(async move {
            run_spawn(registry, chat, item, reply, shutdown).await;
        });
    }
}

fn new_ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Lifecycle of one spawn: open, announce, wait for the claim window, expire.
async fn run_spawn(
    registry: Arc<Registry>,
    chat: ChatId,
    item: Item,
    reply: Option<oneshot::Sender<AppResult<SpawnSession>>>,
    shutdown: ShutdownSignal,
) {
    let sessions = &registry.services.sessions;

    let session = match sessions.open(chat, item).await {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!(chat = %chat, error = %e, "spawn not opened");
            if let Some(reply) = reply {
                let _ = reply.send(Err(e));
            }
            return;
        }
    };
    if let Some(reply) = reply {
        let _ = reply.send(Ok(session.clone()));
    }

    if let Err(e) = registry.repos.chat.mark_spawned(chat, session.created_at).await {
        tracing::warn!(chat = %chat, error = %e, "could not record spawn time");
    }

    let caption = messages::spawn_caption(&session.item);
    if let Err(e) = registry.client.send_media(chat, &session.item.media, &caption).await {
        tracing::error!(chat = %chat, session = %session.id, error = %e, "spawn announcement failed");
        sessions.abandon(chat, session.id).await;
        return;
    }

    let timeout = registry.settings.snapshot().claim_timeout();
    tokio::select! {
        _ = wait_for_shutdown(shutdown) => return,
        _ = tokio::time::sleep(timeout) => {}
    }

    expire_and_announce(&registry, chat, session.id).await;
}

async fn expire_and_announce(registry: &Registry, chat: ChatId, session: SessionId) {
    let ExpireOutcome::Expired(expired) = registry.services.sessions.expire_session(chat, session).await else {
        return;
    };

    if let Err(e) = registry.client.send_text(chat, &messages::no_winner(&expired)).await {
        tracing::warn!(chat = %chat, session = %session, error = %e, "could not announce expiry");
    }
}

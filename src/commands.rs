use crate::db::error::DbError;
use crate::error::DomainError;
use crate::game::messages;
use crate::game::scheduler::SchedulerHandle;
use crate::input::parser::{Command, Verb};
use crate::models::types::{ChatId, UserId};
use crate::net::{InboundEvent, PlatformError};
use crate::state::registry::Registry;
use crate::util::retry::Transient;
use std::sync::Arc;
use thiserror::Error;

mod balance;
mod guess;
mod interval;
mod inventory;
mod pay;
mod reload;
mod spawn;
mod top;
mod upload;

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("permission denied")]
    PermissionDenied,

    #[error("only works in group chats")]
    GroupOnly,

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl CommandError {
    /// What the user gets to see. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            CommandError::UnknownCommand(cmd) => format!("Unknown command /{cmd}. Try /help."),
            CommandError::Usage(usage) => format!("Usage: {usage}"),
            CommandError::PermissionDenied => "Only admins can do that.".into(),
            CommandError::GroupOnly => "That only works in a group chat.".into(),
            CommandError::InvalidArgs(msg) => msg.clone(),
            CommandError::Domain(e) => match e {
                DomainError::NotFound(what) => format!("Not found: {what}"),
                DomainError::AlreadyOpen(_) => "There is already a character waiting to be caught here.".into(),
                DomainError::NoActiveSpawn(_) => messages::no_active_spawn().into(),
                DomainError::InsufficientBalance { have, need } => {
                    format!("Not enough coins: you have {have}, need {need}.")
                }
                DomainError::Duplicate(what) => format!("{what} is already in the catalog."),
                DomainError::EmptyCatalog => "The catalog is empty. An admin has to /upload characters first.".into(),
                DomainError::Validation { message, .. } => message.clone(),
                e if e.is_transient() => messages::try_again().into(),
                _ => "Something went wrong.".into(),
            },
            CommandError::Platform(_) | CommandError::Db(_) if self.is_transient() => messages::try_again().into(),
            CommandError::Platform(_) | CommandError::Db(_) => "Something went wrong.".into(),
        }
    }
}

impl Transient for CommandError {
    fn is_transient(&self) -> bool {
        match self {
            CommandError::Domain(e) => e.is_transient(),
            CommandError::Platform(e) => e.is_transient(),
            CommandError::Db(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Command context passed to command handlers
pub struct CmdCtx {
    /// Global service registry
    pub registry: Arc<Registry>,
    /// For admin spawns
    pub scheduler: SchedulerHandle,
    /// The message that triggered the command
    pub event: InboundEvent,
}

impl CmdCtx {
    pub fn chat(&self) -> ChatId {
        self.event.chat
    }

    pub fn user(&self) -> UserId {
        self.event.user
    }

    pub fn user_name(&self) -> Option<&str> {
        self.event.user_name.as_deref()
    }

    pub fn is_admin(&self) -> bool {
        self.registry.settings.snapshot().is_admin(self.user())
    }

    pub fn require_admin(&self) -> CommandResult {
        if self.is_admin() {
            Ok(())
        } else {
            Err(CommandError::PermissionDenied)
        }
    }

    pub fn require_group(&self) -> CommandResult {
        if self.event.chat_kind.is_group() {
            Ok(())
        } else {
            Err(CommandError::GroupOnly)
        }
    }

    /// Reply to the triggering message
    pub async fn reply(&self, text: &str) -> CommandResult {
        self.registry
            .client
            .reply_text(self.chat(), self.event.message_id, text)
            .await?;
        Ok(())
    }
}

pub async fn process_command(cmd: Command, ctx: Arc<CmdCtx>) -> CommandResult {
    if cmd.verb.is_admin() {
        ctx.require_admin()?;
    }

    match cmd.verb {
        Verb::Start => ctx.reply(messages::welcome()).await,
        Verb::Help => ctx.reply(&messages::help_text(ctx.is_admin())).await,
        Verb::Ping => ctx.reply("Pong!").await,
        Verb::Balance => balance::balance(ctx.clone(), cmd).await,
        Verb::Inventory => inventory::inventory(ctx.clone(), cmd).await,
        Verb::Guess => guess::guess(ctx.clone(), cmd).await,
        Verb::Pay => pay::pay(ctx.clone(), cmd).await,
        Verb::Top => top::top(ctx.clone(), cmd).await,
        Verb::GroupTop => top::group_top(ctx.clone(), cmd).await,
        Verb::Spawn => spawn::spawn(ctx.clone(), cmd).await,
        Verb::SetInterval => interval::set_interval(ctx.clone(), cmd).await,
        Verb::Upload => upload::upload(ctx.clone(), cmd).await,
        Verb::Reload => reload::reload(ctx.clone(), cmd).await,
        Verb::Custom(name) => Err(CommandError::UnknownCommand(name)),
    }
}

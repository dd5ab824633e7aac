use crate::commands::{CmdCtx, CommandError, CommandResult};
use crate::error::DomainError;
use crate::input::parser::Command;
use std::sync::Arc;

/// Re-reads the config file and environment and swaps in the new game settings.
pub async fn reload(ctx: Arc<CmdCtx>, _cmd: Command) -> CommandResult {
    let game = ctx
        .registry
        .config
        .reload_game()
        .map_err(|e| CommandError::Domain(DomainError::Infra(e)))?;

    ctx.registry
        .settings
        .replace(game)
        .map_err(|e| CommandError::InvalidArgs(format!("new settings are invalid: {e}")))?;

    tracing::info!(admin = %ctx.user(), "game settings reloaded");
    ctx.reply("Settings reloaded.").await
}

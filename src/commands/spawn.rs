use crate::commands::{CmdCtx, CommandError, CommandResult};
use crate::error::DomainError;
use crate::input::parser::Command;
use std::sync::Arc;

/// `/spawn` picks by rarity weight, `/spawn <name>` spawns that character.
pub async fn spawn(ctx: Arc<CmdCtx>, cmd: Command) -> CommandResult {
    ctx.require_group()?;

    let item = if cmd.rest.is_empty() {
        None
    } else {
        let found = ctx.registry.services.catalog.find_by_name(&cmd.rest).await?;
        match found {
            Some(item) => Some(item),
            None => return Err(DomainError::NotFound(format!("no character called '{}'", cmd.rest)).into()),
        }
    };

    let session = ctx.scheduler.spawn_now(ctx.chat(), item).await.map_err(CommandError::from)?;
    tracing::info!(chat = %ctx.chat(), admin = %ctx.user(), item = %session.item.name, "admin spawn");
    Ok(())
}

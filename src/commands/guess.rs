use crate::commands::{CmdCtx, CommandError, CommandResult};
use crate::game::messages;
use crate::input::parser::Command;
use crate::services::ClaimOutcome;
use std::sync::Arc;

/// Explicit guess. Unlike free text, every outcome gets an answer.
pub async fn guess(ctx: Arc<CmdCtx>, cmd: Command) -> CommandResult {
    ctx.require_group()?;
    if cmd.rest.is_empty() {
        return Err(CommandError::Usage("/guess <name>"));
    }

    let outcome = ctx
        .registry
        .services
        .sessions
        .claim(ctx.chat(), ctx.user(), ctx.user_name(), &cmd.rest)
        .await?;

    match outcome {
        ClaimOutcome::Won(receipt) => ctx.reply(&messages::winner(&receipt)).await,
        ClaimOutcome::Miss => ctx.reply(messages::miss()).await,
        ClaimOutcome::NoActiveSpawn => ctx.reply(messages::no_active_spawn()).await,
    }
}

use crate::commands::{CmdCtx, CommandError, CommandResult};
use crate::input::parser::Command;
use std::sync::Arc;

const USAGE: &str = "/set-interval <minutes>";

/// Rewrites the spawn interval of every known chat, and the default for new ones.
pub async fn set_interval(ctx: Arc<CmdCtx>, cmd: Command) -> CommandResult {
    let [minutes] = cmd.args.as_slice() else {
        return Err(CommandError::Usage(USAGE));
    };
    let minutes: u64 = minutes
        .parse()
        .ok()
        .filter(|m| *m > 0)
        .ok_or_else(|| CommandError::InvalidArgs(format!("'{minutes}' is not a positive number of minutes.")))?;

    let secs = minutes
        .checked_mul(60)
        .and_then(|s| i64::try_from(s).ok())
        .ok_or_else(|| CommandError::InvalidArgs("interval is too large.".into()))?;
    ctx.registry
        .settings
        .update(|g| g.spawn_interval_secs = secs as u64)
        .map_err(|e| CommandError::InvalidArgs(e.to_string()))?;

    let repo = &ctx.registry.repos.chat;
    let updated = ctx
        .registry
        .retry
        .run("chat.set_interval_all", || repo.set_interval_all(secs))
        .await?;

    tracing::info!(admin = %ctx.user(), minutes, chats = updated, "spawn interval changed");
    ctx.reply(&format!("Spawn interval set to {minutes} minutes for {updated} chats."))
        .await
}

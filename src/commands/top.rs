use crate::commands::{CmdCtx, CommandResult};
use crate::game::messages;
use crate::input::parser::Command;
use std::sync::Arc;

const LEADERBOARD_SIZE: i64 = 10;

pub async fn top(ctx: Arc<CmdCtx>, _cmd: Command) -> CommandResult {
    let rows = ctx.registry.services.inventory.top_users(LEADERBOARD_SIZE).await?;
    ctx.reply(&messages::leaderboard_global(&rows)).await
}

pub async fn group_top(ctx: Arc<CmdCtx>, _cmd: Command) -> CommandResult {
    ctx.require_group()?;
    let rows = ctx
        .registry
        .services
        .inventory
        .top_in_group(ctx.chat(), LEADERBOARD_SIZE)
        .await?;
    ctx.reply(&messages::leaderboard_group(&rows)).await
}

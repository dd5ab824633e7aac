use crate::commands::{CmdCtx, CommandResult};
use crate::input::parser::Command;
use std::sync::Arc;

pub async fn balance(ctx: Arc<CmdCtx>, _cmd: Command) -> CommandResult {
    let amount = ctx.registry.services.ledger.get(ctx.user()).await?;
    ctx.reply(&format!("You have {amount} coins.")).await
}

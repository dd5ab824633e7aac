use crate::commands::{CmdCtx, CommandError, CommandResult};
use crate::input::parser::Command;
use crate::models::types::UserId;
use std::sync::Arc;

const USAGE: &str = "/pay <user_id> <amount>";

pub async fn pay(ctx: Arc<CmdCtx>, cmd: Command) -> CommandResult {
    let [to, amount] = cmd.args.as_slice() else {
        return Err(CommandError::Usage(USAGE));
    };

    let to: UserId = to
        .parse()
        .map_err(|_| CommandError::InvalidArgs(format!("'{to}' is not a user id.")))?;
    let amount: i64 = amount
        .parse()
        .ok()
        .filter(|a| *a > 0)
        .ok_or_else(|| CommandError::InvalidArgs(format!("'{amount}' is not a positive amount.")))?;

    let (from_balance, _) = ctx.registry.services.ledger.transfer(ctx.user(), to, amount).await?;
    ctx.reply(&format!(
        "Sent {amount} coins to {to}. You have {} left.",
        from_balance.amount
    ))
    .await
}

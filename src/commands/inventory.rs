use crate::commands::{CmdCtx, CommandResult};
use crate::input::parser::Command;
use std::sync::Arc;

/// Longer collections are cut off; chat messages have a size limit.
const MAX_LINES: usize = 50;

pub async fn inventory(ctx: Arc<CmdCtx>, _cmd: Command) -> CommandResult {
    let holdings = ctx.registry.services.inventory.holdings(ctx.user()).await?;
    if holdings.is_empty() {
        return ctx.reply("Your collection is empty. Catch something first!").await;
    }

    let total: i64 = holdings.iter().map(|h| h.count).sum();
    let mut text = format!("Your collection ({total} caught, {} unique)\n", holdings.len());
    for holding in holdings.iter().take(MAX_LINES) {
        text.push_str(&format!("{} {}\n", holding.display_text(), holding.item.rarity));
    }
    if holdings.len() > MAX_LINES {
        text.push_str(&format!("... and {} more", holdings.len() - MAX_LINES));
    }

    ctx.reply(text.trim_end()).await
}

use crate::commands::{CmdCtx, CommandError, CommandResult};
use crate::input::parser::Command;
use crate::models::item::{NewItem, Rarity};
use std::sync::Arc;

const USAGE: &str = "/upload <media> <name> <series> <rarity>  (use _ for spaces, rarity 1-4 or a name)";

pub async fn upload(ctx: Arc<CmdCtx>, cmd: Command) -> CommandResult {
    let [media, name, series, rarity] = cmd.args.as_slice() else {
        return Err(CommandError::Usage(USAGE));
    };

    let rarity: Rarity = rarity.parse()?;
    let item = ctx
        .registry
        .services
        .catalog
        .upload(NewItem {
            name: name.clone(),
            series: series.clone(),
            rarity,
            media: media.clone(),
        })
        .await?;

    ctx.reply(&format!(
        "Added {} ({}), {}. Id {}.",
        item.name, item.series, item.rarity, item.id
    ))
    .await
}

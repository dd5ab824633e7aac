use anyhow::Context;
use catchbot::config::{Config, SettingsHandle, StoreKind};
use catchbot::db::Db;
use catchbot::error::DomainError;
use catchbot::models::item::NewItem;
use catchbot::services::CatalogService;
use catchbot::util::retry::RetryPolicy;
use catchbot::Repos;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

// cargo run --bin import-catalog -- --file characters.yaml
//
// characters.yaml:
//   - name: Asuka Langley
//     series: Neon Genesis Evangelion
//     rarity: epic
//     media: https://files.example/asuka.jpg

#[derive(Debug, Parser)]
#[command(name = "import-catalog", version, about = "Bulk import characters into the catalog")]
struct Args {
    /// YAML file with a list of characters
    #[arg(long)]
    file: PathBuf,

    /// Override database URL (if omitted, use env/config)
    #[arg(long)]
    database_url: Option<String>,

    /// Config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parse and validate only, write nothing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let cfg = Config::load(args.config.as_deref())?;
    if cfg.store == StoreKind::Memory && !args.dry_run {
        anyhow::bail!("importing into the in-memory store makes no sense; use --dry-run or a database");
    }

    let raw = std::fs::read_to_string(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let items: Vec<NewItem> = serde_yaml::from_str(&raw).with_context(|| format!("parsing {}", args.file.display()))?;

    for (idx, item) in items.iter().enumerate() {
        item.validate()
            .with_context(|| format!("entry #{} ({})", idx + 1, item.name))?;
    }

    if args.dry_run {
        println!("{} entries look fine", items.len());
        return Ok(());
    }

    let database_url = args.database_url.as_deref().unwrap_or(&cfg.database_url);
    let db = Arc::new(Db::new(database_url)?);
    db.init().await?;

    let repos = Repos::postgres(db);
    let catalog = CatalogService::new(repos.catalog.clone(), SettingsHandle::new(cfg.game.clone()), RetryPolicy::default());

    let mut added = 0;
    let mut skipped = 0;
    for item in items {
        let name = item.name.clone();
        match catalog.upload(item).await {
            Ok(item) => {
                println!("+ {} ({}) [{}]", item.name, item.series, item.rarity);
                added += 1;
            }
            Err(DomainError::Duplicate(_)) => {
                println!("= {name} already in catalog, skipped");
                skipped += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("uploading {name}")),
        }
    }

    println!("Done: {added} added, {skipped} skipped.");
    Ok(())
}

//! `yadz cache list|purge --origin O`

use anyhow::Result;
use chrono::DateTime;
use clap::Subcommand;

use super::open_cache;
use crate::App;

const DEFAULT_ORIGIN: &str = "https://www.yad2.co.il";

#[derive(Subcommand)]
pub enum CacheCommands {
    /// List stored entries with their write time
    List {
        #[arg(long, default_value = DEFAULT_ORIGIN)]
        origin: String,
    },
    /// Delete entries older than the cache TTL
    Purge {
        #[arg(long, default_value = DEFAULT_ORIGIN)]
        origin: String,

        /// Delete every entry of the origin regardless of age
        #[arg(long)]
        all: bool,
    },
}

pub async fn run(app: &App, action: CacheCommands) -> Result<()> {
    match action {
        CacheCommands::List { origin } => {
            let cache = open_cache(app, &origin).await?;
            let entries = cache.entries().await?;
            for item in &entries {
                let written = DateTime::from_timestamp_millis(item.updated_at)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| item.updated_at.to_string());
                println!("{}\t{written}", item.key);
            }
            tracing::info!("{} entries for {origin}", entries.len());
        }
        CacheCommands::Purge { origin, all } => {
            let cache = open_cache(app, &origin).await?;
            let removed = if all { cache.store().clear().await? } else { cache.purge_expired().await? };
            println!("{removed}");
            tracing::info!("purged {removed} entries for {origin}");
        }
    }
    Ok(())
}

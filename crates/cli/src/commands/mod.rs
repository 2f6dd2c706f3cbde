//! Subcommand handlers.

pub mod cache;
pub mod hash;
pub mod scan;
pub mod watch;

use std::path::Path;

use anyhow::{Context, Result};
use yadz_client::{LookupClient, LookupConfig, Page, Scanner};
use yadz_core::{CacheDb, ResultCache};

use crate::App;

/// Open the result cache for `origin` in the configured database.
pub async fn open_cache(app: &App, origin: &str) -> Result<ResultCache> {
    let db = CacheDb::open(&app.config.db_path)
        .await
        .with_context(|| format!("opening cache at {}", app.config.db_path.display()))?;
    let store = db.origin_store(origin)?;
    Ok(ResultCache::new(store, app.config.cache_ttl(), app.log.clone()))
}

/// Build a scanner for pages of `origin`.
pub async fn scanner_for(app: &App, origin: &str) -> Result<Scanner> {
    let cache = open_cache(app, origin).await?;
    let client = LookupClient::new(LookupConfig::from(&app.config), cache.clone(), app.log.clone())?;
    Ok(Scanner::new(cache, client, app.log.clone()))
}

/// Load a saved page, attributing it to `url`.
pub async fn read_page(url: &str, path: &Path) -> Result<Page> {
    let html = tokio::fs::read_to_string(path).await.with_context(|| format!("reading {}", path.display()))?;
    Ok(Page::parse(url, &html)?)
}

/// Write the annotated page to `out`, or stdout when no file is given.
pub fn write_output(page: &Page, out: Option<&Path>) -> Result<()> {
    let html = page.html();
    match out {
        Some(path) => std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{html}"),
    }
    Ok(())
}

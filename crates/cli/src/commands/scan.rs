//! `yadz scan <url> [--html FILE] [--out FILE]`

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use yadz_client::{FetchConfig, PageFetcher};

use super::{read_page, scanner_for, write_output};
use crate::App;

#[derive(Args)]
pub struct ScanArgs {
    /// Page URL; selects the page template and the cache origin
    pub url: String,

    /// Saved HTML to scan instead of downloading the URL
    #[arg(long)]
    pub html: Option<PathBuf>,

    /// Write the annotated HTML here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub async fn run(app: &App, args: ScanArgs) -> Result<()> {
    let page = match &args.html {
        Some(path) => read_page(&args.url, path).await?,
        None => {
            let fetcher = PageFetcher::new(FetchConfig::from(&app.config))?;
            let fetched = fetcher.fetch(&args.url).await?;
            tracing::info!(status = %fetched.status, fetch_ms = fetched.fetch_ms, "fetched {}", fetched.page.url());
            fetched.page
        }
    };

    let scanner = scanner_for(app, &page.origin()).await?;
    let report = scanner.scan(&page).await;
    tracing::info!(
        found = report.found,
        skipped = report.skipped,
        cached = report.cached,
        fetched = report.fetched,
        failed = report.failed,
        "scan finished"
    );

    write_output(&page, args.out.as_deref())
}

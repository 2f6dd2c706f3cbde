//! `yadz watch <url> --html FILE [--out FILE]`
//!
//! Runs the driver against a saved page. Every time the file changes on disk
//! its new contents replace the document, which schedules a debounced rescan.
//! The output is rewritten after every scan and every finished lookup. Ctrl-C
//! closes the event source and the last annotated page is written out.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::Result;
use clap::Args;
use tokio::sync::mpsc;
use yadz_client::{Driver, DriverConfig, DriverUpdate, PageEvent};

use super::{read_page, scanner_for, write_output};
use crate::App;

/// How often the saved page is checked for changes.
const FILE_POLL: Duration = Duration::from_millis(250);

#[derive(Args)]
pub struct WatchArgs {
    /// Page URL; selects the page template and the cache origin
    pub url: String,

    /// Saved HTML to watch
    #[arg(long)]
    pub html: PathBuf,

    /// Rewrite the annotated HTML here after every scan instead of printing it
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub async fn run(app: &App, args: WatchArgs) -> Result<()> {
    let page = read_page(&args.url, &args.html).await?;
    let scanner = scanner_for(app, &page.origin()).await?;
    let driver = Driver::new(scanner, DriverConfig::from(&app.config), app.log.clone());

    let (tx, rx) = mpsc::channel(16);
    let out = args.out.as_deref();
    let interrupted = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("interrupted, stopping"),
            Err(e) => tracing::error!("failed to listen for Ctrl-C: {e}"),
        }
    };

    let (page, ()) = tokio::join!(
        driver.run(page, rx, |page, update| {
            match update {
                DriverUpdate::Scanned(report) => tracing::info!(%report, "scan finished"),
                DriverUpdate::Resolved { address, found } => tracing::debug!(%address, found, "lookup finished"),
            }
            if let Err(e) = write_output(page, out) {
                tracing::error!("{e:#}");
            }
        }),
        watch_file(&args.html, tx, interrupted),
    );

    write_output(&page, out)
}

/// Forward file changes as page replacements until `shutdown` completes.
///
/// Dropping `tx` on return is what stops the driver.
async fn watch_file(path: &Path, tx: mpsc::Sender<PageEvent>, shutdown: impl Future<Output = ()>) {
    tokio::pin!(shutdown);
    let mut last_modified = modified(path).await;
    let mut ticker = tokio::time::interval(FILE_POLL);

    loop {
        tokio::select! {
            () = &mut shutdown => return,
            _ = ticker.tick() => {}
        }

        let current = modified(path).await;
        if current.is_none() || current == last_modified {
            continue;
        }
        last_modified = current;

        let html = tokio::select! {
            () = &mut shutdown => return,
            read = tokio::fs::read_to_string(path) => match read {
                Ok(html) => html,
                Err(e) => {
                    tracing::warn!("failed to read {}: {e}", path.display());
                    continue;
                }
            },
        };

        tracing::debug!("{} changed", path.display());
        tokio::select! {
            () = &mut shutdown => return,
            sent = tx.send(PageEvent::Replace { html }) => {
                if sent.is_err() {
                    return;
                }
            }
        }
    }
}

async fn modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok().and_then(|m| m.modified().ok())
}

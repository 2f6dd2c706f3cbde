//! yadz command line entry point.
//!
//! Runs the annotation pipeline against saved or downloaded listing pages.
//! Logging goes to stderr so annotated HTML can be piped from stdout.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use yadz_core::{AppConfig, ScanLog, TracingLog};

mod commands;

/// Annotate real-estate listings with travel time and fiber availability.
#[derive(Parser)]
#[command(name = "yadz", version, propagate_version = true)]
struct Cli {
    /// Log per-scan details (same as YADZ_VERBOSE=true)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a page once and print the annotated HTML
    Scan(commands::scan::ScanArgs),
    /// Keep rescanning a saved page while it changes on disk
    Watch(commands::watch::WatchArgs),
    /// Print the storage key of an address
    Hash(commands::hash::HashArgs),
    /// Inspect or purge cached lookup results
    Cache {
        #[command(subcommand)]
        action: commands::cache::CacheCommands,
    },
}

/// Loaded configuration plus the logging capability handed to components.
pub struct App {
    pub config: AppConfig,
    pub log: Arc<dyn ScanLog>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    config.verbose |= cli.verbose;
    init_tracing(cli.json_logs, config.verbose);

    let log: Arc<dyn ScanLog> = Arc::new(TracingLog::new(config.verbose));
    let app = App { config, log };

    match cli.command {
        Commands::Scan(args) => commands::scan::run(&app, args).await,
        Commands::Watch(args) => commands::watch::run(&app, args).await,
        Commands::Hash(args) => commands::hash::run(args),
        Commands::Cache { action } => commands::cache::run(&app, action).await,
    }
}

fn init_tracing(json: bool, verbose: bool) {
    let default_filter = if verbose { "info,yadz=debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

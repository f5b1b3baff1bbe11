//! avisos CLI
//!
//! One invocation runs one watch cycle: log in to the portal, scrape the
//! pending messages, notify the new ones, persist the seen-state.

use std::path::PathBuf;

use avisos::{
    config::Config,
    error::Result,
    pipeline::{DateCutoff, run_watch},
    services::{PortalClient, TelegramNotifier},
    storage::StateStore,
};
use clap::{Parser, Subcommand};

/// avisos - Séneca pending messages watcher
#[derive(Parser, Debug)]
#[command(
    name = "avisos",
    version,
    about = "Watches the Séneca portal for new pending messages"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one watch cycle: scrape, notify, persist
    Run {
        /// Only notify messages dated after this day (YYYYMMDD)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Show current seen-state info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("avisos starting...");

    let config = Config::load(&cli.config)?;
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { date } => {
            config.validate()?;

            let cutoff = date.as_deref().map(DateCutoff::parse).transpose()?;
            let store = StateStore::new(&config.state.path);
            let portal = PortalClient::new(config.portal.clone())?;
            let telegram = TelegramNotifier::new(&config.telegram)?;

            let outcome = run_watch(&store, cutoff.as_ref(), &portal, &telegram).await?;

            log::info!(
                "Cycle complete: {} delivered, {} already seen, {} filtered",
                outcome.delivered,
                outcome.skipped_seen,
                outcome.skipped_filtered
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }

            log::info!("✓ Portal: {}", config.portal.login_url);
            log::info!("✓ Telegram chat: {}", config.telegram.chat_id);
            log::info!("✓ State file: {}", config.state.path.display());
            log::info!("All validations passed!");
        }

        Command::Info => {
            let store = StateStore::new(&config.state.path);
            let seen = store.load().await?;

            log::info!("State file: {}", config.state.path.display());
            log::info!("Known messages: {}", seen.len());

            if let Some((identity, entry)) = seen.iter().last() {
                log::info!("Most recent: \"{}\" ({})", entry.title, entry.processed_at);
                log::debug!("Identity: {}", identity);
            } else {
                log::info!("No messages processed yet.");
            }
        }
    }

    log::info!("Done!");

    Ok(())
}

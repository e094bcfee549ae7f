//! magstore binary
//!
//! Loads configuration, opens the torrent database and consumes the
//! discovery queue until Ctrl+C.

use std::process::ExitCode;

use clap::Parser;
use magstore::config::{DEFAULT_CONFIG_FILE, Settings, load_config_from};
use magstore::persistence::SledStore;
use magstore::queue::{AmqpTransport, IngestService, Timings};
use magstore::utils::logging;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "magstore", about = "Persist torrents discovered on the magnetico queue")]
struct Args {
    /// Configuration file, extension optional
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Overrides `log.level` from the configuration
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let settings = match load_config_from(&args.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(args.log_level.as_deref().unwrap_or(&settings.log.level));

    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("magstore failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> magstore::Result<()> {
    let store = SledStore::open(&settings.storage.path)?;
    info!(path = %settings.storage.path, torrents = store.torrent_count(), "Opened torrent store");

    let timings = Timings {
        shutdown_grace: settings.shutdown.grace(),
        ..Timings::default()
    };
    let service = IngestService::start(AmqpTransport::new(settings.amqp.url), store, timings).await?;

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received. Exiting gracefully."),
        Err(e) => error!("Failed to listen for shutdown signal: {e}"),
    }

    service.close().await
}

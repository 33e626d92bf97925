use anyhow::Context;
use clap::Parser;
use gong2sentinel::config::{Config, DEFAULT_CONFIG_FILE};
use gong2sentinel::gong::{GongClient, GongSource};
use gong2sentinel::ingestion::{IngestionRouter, LogSink, SentinelClient};
use gong2sentinel::{CollectionOrchestrator, LogTypeRegistry};
use log::{error, info, warn, LevelFilter};
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line arguments for the Gong to Sentinel log shipper
#[derive(Parser)]
#[command(
    name = "gong2sentinel",
    about = "Ship Gong audit and call access logs to Microsoft Sentinel",
    long_about = "Pulls audit logs and call user-access records from the Gong API, flattens them \
                  and delivers them to Azure Monitor data collection rule streams. Runs once and \
                  exits non-zero on any failure."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_FILE,
        help = "Configuration file path (TOML format)"
    )]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable debug logging regardless of configuration")]
    verbose: bool,
}

impl Cli {
    /// Log filter to start with when `RUST_LOG` is not set
    fn log_filter(&self, configured: Option<LevelFilter>) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            configured.unwrap_or(LevelFilter::Info)
        }
    }
}

/// Collect from Gong, then ship to Sentinel
async fn run(config: Config) -> anyhow::Result<()> {
    let source: Arc<dyn GongSource> = Arc::new(
        GongClient::with_base_url(
            config.gong.access_key.clone(),
            config.gong.access_secret.clone(),
            config.gong.base_url.clone(),
        )
        .context("could not create Gong client")?,
    );
    let registry = Arc::new(LogTypeRegistry::builtin());

    let lookup_window = config.lookup_window()?;
    let orchestrator = CollectionOrchestrator::new(source, registry, lookup_window);
    let logs = orchestrator
        .collect()
        .await
        .context("failed to retrieve logs")?;

    let sink: Arc<dyn LogSink> = Arc::new(
        SentinelClient::with_authority(config.credentials(), config.microsoft.authority.clone())
            .context("could not create MS Sentinel client")?,
    );
    let router = IngestionRouter::new(sink, config.destination());
    router.ship(logs).await.context("failed to ingest logs")?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = Config::load(&cli.config);
    let configured_level = loaded.as_ref().ok().and_then(|c| c.log_level().ok());

    env_logger::Builder::new()
        .filter_level(cli.log_filter(configured_level))
        .parse_default_env()
        .init();

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration '{}': {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    if cli.config.exists() {
        info!("Loaded configuration from: {}", cli.config.display());
    } else {
        warn!(
            "Configuration file '{}' not found, using environment only",
            cli.config.display()
        );
    }
    info!("Starting Gong log shipping");

    if let Err(e) = run(config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    info!("Gong log shipping complete");
}

//! Quyca - Entry Point
//!
//! Serves the reporting API over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quyca::{Config, CurrencyConverter, MongoStore, Services, server::QuycaServer};

#[derive(Parser, Debug)]
#[command(name = "quyca")]
#[command(about = "Bibliometrics reporting service over a KAHI MongoDB")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value = "8010", env = "PORT")]
    port: u16,

    /// MongoDB connection string
    #[arg(long, env = "MONGO_URI")]
    mongo_uri: Option<String>,

    /// Database holding the KAHI collections
    #[arg(long, env = "MONGO_DATABASE")]
    database: Option<String>,

    /// JSON file overriding the built-in exchange rate and CPI tables
    #[arg(long, env = "QUYCA_CURRENCY_TABLE")]
    currency_table: Option<PathBuf>,

    /// ISO-3166 alpha-2 code of the country shown in the city map
    #[arg(long, env = "QUYCA_HOME_COUNTRY")]
    home_country: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), port = cli.port, "Starting Quyca");

    let mut config = Config::from_env()?;
    if let Some(uri) = cli.mongo_uri {
        config.mongo_uri = uri;
    }
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(country) = cli.home_country {
        config = config.with_home_country(&country)?;
    }
    if let Some(path) = cli.currency_table {
        config.currency_table = Some(path);
    }

    let mut currency = CurrencyConverter::new(config.apc_target_year);
    if let Some(path) = &config.currency_table {
        currency = currency.with_overrides_file(path)?;
    }

    let store = MongoStore::connect(&config).await?;
    tracing::info!(
        database = %config.database,
        home_country = %config.home_country,
        apc_year = config.apc_target_year,
        caching = config.caching_enabled(),
        "Configuration loaded"
    );

    let services = Services::new(Arc::new(store), config, currency);
    QuycaServer::new(services).run_http(cli.port).await
}

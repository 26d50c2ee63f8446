//! Market Updater Binary
//!
//! Starts the periodic listings collector.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin market-updater
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `APIKEY`: CoinMarketCap Pro API key
//! - `PROJECT_ID`: Google Cloud project holding the Firestore database
//!
//! ## Optional
//! - `CMC_LISTINGS_URL`: listings endpoint (default: Pro API listings/latest)
//! - `CMC_LIMIT`: listings per request (default: 10)
//! - `CMC_CONVERT`: quote currency (default: USD)
//! - `INDIVIDUAL_INTERVAL_SECS`: per-record write period (default: 60)
//! - `BATCH_INTERVAL_SECS`: batch write period (default: 60)
//! - `INDIVIDUAL_COLLECTION`: per-record collection (default: Market)
//! - `BATCH_COLLECTION`: batch collection (default: BatchMarket)
//! - `FIRESTORE_DATABASE`: database id (default: (default))
//! - `FIRESTORE_EMULATOR_HOST`: emulator `host:port`
//! - `GOOGLE_OAUTH_ACCESS_TOKEN`: fixed bearer token for Firestore
//!   (default: Application Default Credentials)
//! - `GOOGLE_APPLICATION_CREDENTIALS`: service account key file, read by
//!   the credential lookup
//! - `PORT`: health check HTTP port (default: 8080)
//! - `METRICS_PORT`: Prometheus metrics port (default: 0, disabled)
//! - `OTEL_ENABLED`: enable OpenTelemetry (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4317>)
//! - `OTEL_SERVICE_NAME`: service name (default: market-updater)
//! - `OTEL_TRACES_SAMPLER_ARG`: trace sample ratio (default: 0.5)
//! - `RUST_LOG`: log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use market_updater::infrastructure::telemetry;
use market_updater::{
    CoinMarketCapClient, FirestoreStore, HealthServer, Pipeline, PollScheduler, UpdaterConfig,
    UpsertSink, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting market updater");

    let config = UpdaterConfig::from_env().context("failed to load configuration")?;
    log_config(&config);

    if config.server.metrics_port != 0 {
        init_metrics(config.server.metrics_port).context("failed to start metrics exporter")?;
    }

    let store = FirestoreStore::new(&config.firestore)
        .await
        .context("failed to create Firestore client")?;
    let source = CoinMarketCapClient::new(&config.coinmarketcap)
        .context("failed to create listings client")?;

    let shutdown_token = CancellationToken::new();

    let health_server = HealthServer::bind(config.server.health_port, shutdown_token.clone())
        .await
        .context("failed to start health server")?;
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    let sink = UpsertSink::new(Arc::new(store), config.collections.clone());
    let pipeline = Arc::new(Pipeline::new(Arc::new(source), sink, config.fetch.clone()));
    let scheduler = PollScheduler::new(pipeline, shutdown_token.clone());

    tokio::spawn(await_shutdown(shutdown_token));

    scheduler.run(config.schedules()).await;

    tracing::info!("Market updater stopped");
    Ok(())
}

/// Log the parsed configuration.
fn log_config(config: &UpdaterConfig) {
    tracing::info!(
        project_id = %config.firestore.project_id,
        database = %config.firestore.database,
        limit = config.fetch.limit,
        convert = %config.fetch.quote_currency,
        individual_collection = %config.collections.individual,
        batch_collection = %config.collections.batch,
        individual_every_secs = config.intervals.individual.as_secs(),
        batch_every_secs = config.intervals.batch.as_secs(),
        health_port = config.server.health_port,
        metrics_port = config.server.metrics_port,
        "Configuration loaded"
    );
    tracing::debug!(
        listings_url = %config.coinmarketcap.listings_url,
        firestore_url = %config.firestore.base_url,
        "Endpoints"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT), then cancel the token.
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}

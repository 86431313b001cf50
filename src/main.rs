//! Disease Prediction Service - Main Entry Point
//!
//! Loads the fitted transformer set and classifier at startup, then serves
//! predictions over HTTP. A failed asset load leaves the process running
//! but unready, so health checks can tell "not yet ready" from "broken".

use anyhow::Result;
use disease_prediction_service::{
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    server::{self, AppState},
    AssetStore,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Build the subscriber from the configured level and format; RUST_LOG
/// overrides the configured level when set.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("disease_prediction_service={}", logging.level))
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration comes first so logging can honor its [logging] section.
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    init_logging(&config.logging);

    info!("Starting Disease Prediction Service");
    if let Some(e) = config_error {
        error!(error = %e, "Failed to load configuration, using defaults");
    }

    // Load fitted assets; the service stays up unready on failure.
    let assets = match AssetStore::load(&config.assets.dir, config.assets.onnx_threads) {
        Ok(store) => {
            info!("Model and preprocessors loaded successfully");
            Some(Arc::new(store))
        }
        Err(e) => {
            error!(error = %e, "Asset loading failed; serving unready");
            None
        }
    };

    // Initialize metrics and start the periodic reporter
    let metrics = Arc::new(ServiceMetrics::new());
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    let state = AppState::new(assets, metrics);
    let app = server::router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening for prediction requests");

    axum::serve(listener, app).await?;

    Ok(())
}

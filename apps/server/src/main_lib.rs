use std::sync::Arc;

use anyhow::Context;
use ballotwatch_core::{
    prediction::{
        ExponentialBackoff, HttpPredictionClient, NoRetry, PredictionSource, RetryPolicy,
        RetryingPredictionSource,
    },
    store::DocumentStore,
    watcher::ShutdownReport,
    PredictionWatcher, WatcherStatus,
};
use ballotwatch_storage_mongo::MongoDocumentStore;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{config::Config, events::EventBus};

pub struct AppState {
    pub event_bus: EventBus,
    pub watcher: WatcherStatus,
    /// Cancelled when the process begins shutting down; ends open event streams.
    pub shutdown: CancellationToken,
}

pub fn init_tracing() {
    let fmt_layer = fmt::layer().json().with_current_span(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn build_state(
    event_bus: EventBus,
    watcher: WatcherStatus,
    shutdown: CancellationToken,
) -> Arc<AppState> {
    Arc::new(AppState {
        event_bus,
        watcher,
        shutdown,
    })
}

/// Connects to MongoDB as configured. The connection itself is verified
/// when the watcher starts.
pub async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store = MongoDocumentStore::connect(&config.mongo_uri, config.mongo_db_name.as_deref())
        .await
        .context("failed to configure MongoDB client")?;
    tracing::info!("Using MongoDB database {}", store.database_name());
    Ok(Arc::new(store))
}

pub fn build_prediction_source(config: &Config) -> anyhow::Result<Arc<dyn PredictionSource>> {
    let client = HttpPredictionClient::with_timeout(&config.prediction_url, config.prediction_timeout)
        .context("failed to build prediction client")?;
    tracing::info!("Prediction service at {}", client.base_url());

    let policy: Arc<dyn RetryPolicy> = if config.prediction_max_retries == 0 {
        Arc::new(NoRetry)
    } else {
        Arc::new(ExponentialBackoff {
            max_retries: config.prediction_max_retries,
            ..ExponentialBackoff::default()
        })
    };
    Ok(Arc::new(RetryingPredictionSource::new(Arc::new(client), policy)))
}

pub fn build_watcher(
    config: &Config,
    store: Arc<dyn DocumentStore>,
    source: Arc<dyn PredictionSource>,
    event_bus: &EventBus,
) -> PredictionWatcher {
    if let Some(election) = &config.watcher.default_election {
        tracing::info!("Unresolved changes fall back to election {}", election);
    }
    PredictionWatcher::new(
        store,
        source,
        Arc::new(event_bus.clone()),
        config.watcher.clone(),
    )
}

/// Starts the watcher, then serves `router` until `shutdown` is cancelled.
///
/// Once the watcher has started it is shut down on every exit, including a
/// server error.
pub async fn serve(
    listener: TcpListener,
    router: axum::Router,
    watcher: &mut PredictionWatcher,
    shutdown: CancellationToken,
) -> anyhow::Result<ShutdownReport> {
    watcher
        .start()
        .await
        .context("failed to start prediction watcher")?;

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await;

    let report = watcher.shutdown().await;
    tracing::info!(
        "Shutdown complete: {} feed(s) closed, {} failed",
        report.closed.len(),
        report.failed.len()
    );
    served.context("server error")?;
    Ok(report)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Unable to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Termination signal received");
}

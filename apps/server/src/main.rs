use ballotwatch_server::{
    api::app_router, build_prediction_source, build_state, build_store, build_watcher,
    config::Config, events::EventBus, init_tracing, serve, shutdown_signal,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let event_bus = EventBus::new(config.event_bus_capacity);
    let store = build_store(&config).await?;
    let source = build_prediction_source(&config)?;
    let mut watcher = build_watcher(&config, store, source, &event_bus);

    let shutdown = CancellationToken::new();
    let state = build_state(event_bus, watcher.status(), shutdown.clone());
    let router = app_router(state, &config);

    // Bound before the watcher opens any feed.
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!("Listening on {}", config.listen_addr);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    serve(listener, router, &mut watcher, shutdown).await?;
    Ok(())
}

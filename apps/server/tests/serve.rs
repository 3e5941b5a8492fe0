use std::{sync::Arc, time::Duration};

use ballotwatch_core::{store::MemoryDocumentStore, WatcherState};
use ballotwatch_server::{
    api::app_router, build_prediction_source, build_state, build_watcher, config::Config,
    events::EventBus, serve,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

const COLLECTIONS: [&str; 3] = ["reactions", "comments", "posts"];

#[tokio::test]
async fn serve_closes_every_feed_on_shutdown() {
    let config = Config::from_lookup(|_| None).unwrap();
    let store = Arc::new(MemoryDocumentStore::new());
    let bus = EventBus::new(16);
    let source = build_prediction_source(&config).unwrap();
    let mut watcher = build_watcher(&config, store.clone(), source, &bus);
    let status = watcher.status();
    let shutdown = CancellationToken::new();
    let router = app_router(build_state(bus, status.clone(), shutdown.clone()), &config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let stopper = shutdown.clone();
    let observed = status.clone();
    tokio::spawn(async move {
        while !observed.is_running() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        stopper.cancel();
    });

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        serve(listener, router, &mut watcher, shutdown),
    )
    .await
    .expect("server did not stop")
    .unwrap();

    assert_eq!(report.closed.len(), COLLECTIONS.len());
    assert!(report.failed.is_empty());
    assert_eq!(status.state(), WatcherState::Stopped);
    for collection in COLLECTIONS {
        assert_eq!(store.opened_count(collection), 1);
        assert_eq!(store.closed_count(collection), 1);
    }
}

#[tokio::test]
async fn serve_reports_unreachable_store_without_serving() {
    let config = Config::from_lookup(|_| None).unwrap();
    let store = Arc::new(MemoryDocumentStore::new());
    store.fail_connect();
    let bus = EventBus::new(16);
    let source = build_prediction_source(&config).unwrap();
    let mut watcher = build_watcher(&config, store.clone(), source, &bus);
    let status = watcher.status();
    let shutdown = CancellationToken::new();
    let router = app_router(build_state(bus, status.clone(), shutdown.clone()), &config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

    let result = serve(listener, router, &mut watcher, shutdown).await;

    assert!(result.is_err());
    assert_eq!(status.state(), WatcherState::Stopped);
    for collection in COLLECTIONS {
        assert_eq!(store.opened_count(collection), 0);
    }
}

// End-to-end harvesting against a loopback HTTP server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use reqwest::Client;
use sluice_engine::{
    HarvestConfig, HarvestError, HarvestWorker, Supervisor, TransferMetrics, TransferSnapshot,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Lightweight HTTP test server on a random localhost port.
struct TestHttpServer {
    base_url: Url,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestHttpServer {
    async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test HTTP listener");
        let addr = listener
            .local_addr()
            .expect("read test listener local addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });

        tokio::spawn(async move {
            server.await.expect("run test HTTP server");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}")).expect("parse base URL"),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self, path: &str) -> Url {
        self.base_url.join(path).expect("join server URL path")
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}

fn fast_config() -> HarvestConfig {
    HarvestConfig {
        min_cycle_interval: Duration::from_millis(20),
        initial_cycle_interval: Duration::from_millis(20),
        restart_cooldown: Duration::from_millis(100),
        ..HarvestConfig::default()
    }
}

/// Poll shared metrics until `ready` holds or the deadline passes.
async fn wait_for_snapshot(
    metrics: &TransferMetrics,
    ready: impl Fn(&TransferSnapshot) -> bool,
) -> TransferSnapshot {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let snapshot = metrics.snapshot();
        if ready(&snapshot) {
            return snapshot;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for metrics, last snapshot: {snapshot:?}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

const LIVE_PLAYLIST: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:1\n\
#EXT-X-MEDIA-SEQUENCE:1\n\
#EXTINF:0.05,\n\
a.ts\n\
#EXTINF:0.05,\n\
b.ts\n\
#EXTINF:0.05,\n\
a.ts\n\
#EXTINF:0.05,\n\
c.ts\n";

fn segment_route(size: usize) -> axum::routing::MethodRouter {
    get(move || async move { vec![0u8; size] })
}

#[tokio::test]
async fn harvests_each_advertised_segment_exactly_once() {
    let router = Router::new()
        .route("/live/index.m3u8", get(|| async { LIVE_PLAYLIST }))
        .route("/live/a.ts", segment_route(1000))
        .route("/live/b.ts", segment_route(2000))
        .route("/live/c.ts", segment_route(3000));
    let server = TestHttpServer::new(router).await;

    let metrics = Arc::new(TransferMetrics::new());
    let worker = HarvestWorker::new(
        server.url("/live/index.m3u8").as_str(),
        Client::new(),
        fast_config(),
        Arc::clone(&metrics),
    )
    .expect("worker");

    let token = CancellationToken::new();
    let handle = tokio::spawn(worker.run(token.clone()));

    // First cycle downloads a, b, c and skips the repeated a. Waiting for
    // four skips guarantees a full second pass over the same manifest.
    let snapshot = wait_for_snapshot(&metrics, |s| s.segments_skipped >= 4).await;

    token.cancel();
    handle.await.expect("join worker").expect("worker result");

    assert_eq!(snapshot.segments_downloaded, 3);
    assert_eq!(snapshot.bytes_total, 6000);
    assert_eq!(snapshot.download_errors, 0);
}

#[tokio::test]
async fn master_playlist_ends_the_worker_with_a_playlist_error() {
    let master = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=1280000\n\
720p.m3u8\n";
    let router = Router::new().route("/live/index.m3u8", get(move || async move { master }));
    let server = TestHttpServer::new(router).await;

    let worker = HarvestWorker::new(
        server.url("/live/index.m3u8").as_str(),
        Client::new(),
        fast_config(),
        Arc::new(TransferMetrics::new()),
    )
    .expect("worker");

    let err = worker
        .run(CancellationToken::new())
        .await
        .expect_err("worker must fail");
    assert!(matches!(err, HarvestError::Playlist { .. }));
}

#[tokio::test]
async fn missing_playlist_ends_the_worker_with_a_status_error() {
    let server = TestHttpServer::new(Router::new()).await;

    let worker = HarvestWorker::new(
        server.url("/live/index.m3u8").as_str(),
        Client::new(),
        fast_config(),
        Arc::new(TransferMetrics::new()),
    )
    .expect("worker");

    let err = worker
        .run(CancellationToken::new())
        .await
        .expect_err("worker must fail");
    match err {
        HarvestError::HttpStatus { status, .. } => assert_eq!(status, StatusCode::NOT_FOUND),
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_segment_download_does_not_end_the_cycle() {
    let playlist = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:1\n\
#EXT-X-MEDIA-SEQUENCE:1\n\
#EXTINF:0.05,\n\
missing.ts\n\
#EXTINF:0.05,\n\
present.ts\n";
    let router = Router::new()
        .route("/live/index.m3u8", get(move || async move { playlist }))
        .route("/live/present.ts", segment_route(500));
    let server = TestHttpServer::new(router).await;

    let metrics = Arc::new(TransferMetrics::new());
    let worker = HarvestWorker::new(
        server.url("/live/index.m3u8").as_str(),
        Client::new(),
        fast_config(),
        Arc::clone(&metrics),
    )
    .expect("worker");

    let token = CancellationToken::new();
    let handle = tokio::spawn(worker.run(token.clone()));

    let snapshot =
        wait_for_snapshot(&metrics, |s| s.segments_downloaded >= 1 && s.download_errors >= 1).await;

    token.cancel();
    handle.await.expect("join worker").expect("worker result");

    // The 404 on missing.ts was counted but present.ts still came through.
    assert_eq!(snapshot.bytes_total, 500);
}

#[tokio::test]
async fn supervisor_restarts_with_a_fresh_cache_and_carried_metrics() {
    let single_segment = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:1\n\
#EXT-X-MEDIA-SEQUENCE:1\n\
#EXTINF:0.05,\n\
a.ts\n";
    let master = "#EXTM3U\n\
#EXT-X-STREAM-INF:BANDWIDTH=1280000\n\
720p.m3u8\n";

    // Deterministic by hit count: the third playlist fetch is poisoned, so
    // the first worker downloads a.ts, skips it once, then dies. The
    // replacement worker starts with an empty cache and fetches a.ts again.
    let hits = Arc::new(AtomicUsize::new(0));
    let playlist_route = get({
        let hits = Arc::clone(&hits);
        move || {
            let hits = Arc::clone(&hits);
            async move {
                match hits.fetch_add(1, Ordering::SeqCst) {
                    2 => master,
                    _ => single_segment,
                }
            }
        }
    });
    let router = Router::new()
        .route("/live/index.m3u8", playlist_route)
        .route("/live/a.ts", segment_route(100));
    let server = TestHttpServer::new(router).await;

    let supervisor = Supervisor::new(
        vec![server.url("/live/index.m3u8").to_string()],
        fast_config(),
    )
    .expect("supervisor");
    let metrics = supervisor.metrics();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(supervisor.run(async {
        shutdown_rx.await.ok();
    }));

    let snapshot = wait_for_snapshot(&metrics, |s| s.segments_downloaded >= 2).await;

    shutdown_tx.send(()).expect("signal shutdown");
    handle.await.expect("join supervisor");

    // Same URL downloaded once per worker generation; byte accounting
    // accumulated across the restart.
    assert_eq!(snapshot.segments_downloaded, 2);
    assert_eq!(snapshot.bytes_total, 200);
}

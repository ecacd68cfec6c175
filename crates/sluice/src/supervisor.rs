// Supervisor: keeps a harvest worker alive across any failure.

use std::future::Future;
use std::sync::Arc;

use rand::RngExt;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::HarvestError;
use crate::client::build_http_client;
use crate::config::HarvestConfig;
use crate::metrics::TransferMetrics;
use crate::worker::HarvestWorker;

/// Runs [`HarvestWorker`] as a supervised task.
///
/// Worker failures arrive over an mpsc channel instead of unwinding; the
/// supervisor waits a fixed cool-down and starts a fresh worker, forever.
/// There is no retry cutoff and no backoff: a persistently broken source
/// restarts at a fixed rate, which is acceptable for a best-effort
/// harvester.
///
/// The transfer metrics live here and are carried across restarts; every
/// worker gets a fresh recency cache. The source URL is re-picked at
/// random on every spawn.
#[derive(Debug)]
pub struct Supervisor {
    sources: Vec<String>,
    config: HarvestConfig,
    client: Client,
    metrics: Arc<TransferMetrics>,
}

impl Supervisor {
    pub fn new(sources: Vec<String>, config: HarvestConfig) -> Result<Self, HarvestError> {
        if sources.is_empty() {
            return Err(HarvestError::configuration("no manifest URLs configured"));
        }
        let client = build_http_client(&config)?;
        Ok(Self {
            sources,
            config,
            client,
            metrics: Arc::new(TransferMetrics::new()),
        })
    }

    /// Metrics shared with every worker this supervisor spawns.
    pub fn metrics(&self) -> Arc<TransferMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Runs until `shutdown` resolves.
    ///
    /// In-flight work is abandoned on shutdown; nothing durable exists to
    /// corrupt, so an abrupt stop is fine.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        let (failure_tx, mut failure_rx) = mpsc::channel::<HarvestError>(1);
        let token = CancellationToken::new();
        self.spawn_worker(&failure_tx, &token);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping harvest");
                    token.cancel();
                    return;
                }
                Some(err) = failure_rx.recv() => {
                    error!(error = %err, cooldown = ?self.config.restart_cooldown,
                        "Harvest worker failed, restarting after cool-down");
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => {
                            info!("Shutdown requested during cool-down, stopping harvest");
                            token.cancel();
                            return;
                        }
                        _ = tokio::time::sleep(self.config.restart_cooldown) => {}
                    }
                    self.spawn_worker(&failure_tx, &token);
                }
            }
        }
    }

    fn spawn_worker(&self, failure_tx: &mpsc::Sender<HarvestError>, token: &CancellationToken) {
        let source = self.pick_source();
        let client = self.client.clone();
        let config = self.config.clone();
        let metrics = Arc::clone(&self.metrics);
        let failure_tx = failure_tx.clone();
        let token = token.clone();

        tokio::spawn(async move {
            let result = match HarvestWorker::new(&source, client, config, metrics) {
                Ok(worker) => worker.run(token).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                // The supervisor may already be gone during shutdown.
                let _ = failure_tx.send(e).await;
            }
        });
    }

    /// One source chosen uniformly at random, re-picked on every spawn.
    fn pick_source(&self) -> String {
        let index = rand::rng().random_range(0..self.sources.len());
        self.sources[index].clone()
    }
}

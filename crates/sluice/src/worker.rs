// Poll loop: fetch, repair, parse, harvest, sleep, repeat.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::HarvestError;
use crate::cache::RecencyCache;
use crate::config::HarvestConfig;
use crate::harvester::{HarvestOutcome, SegmentHarvester};
use crate::metrics::TransferMetrics;
use crate::playlist::{fetch_playlist, parse_media_playlist, repair_extinf_lines};

/// Computes the delay until the next playlist poll from a segment's
/// declared duration.
///
/// The pacing factor keeps the poll slightly ahead of real-time segment
/// production; the floor keeps a zero-duration playlist from spinning.
pub fn cycle_delay(declared_seconds: f64, config: &HarvestConfig) -> Duration {
    let scaled = declared_seconds * config.pacing_factor;
    let scaled = if scaled.is_finite() && scaled > 0.0 {
        Duration::from_secs_f64(scaled)
    } else {
        Duration::ZERO
    };
    scaled.max(config.min_cycle_interval)
}

/// One harvesting run against a single manifest URL.
///
/// The worker owns its recency cache, so a restarted worker starts with
/// an empty dedup window; the transfer metrics are shared and outlive it.
/// Any manifest-level failure ends the run with an error for the
/// supervisor to handle. Per-segment failures do not.
#[derive(Debug)]
pub struct HarvestWorker {
    manifest_url: Url,
    client: Client,
    config: HarvestConfig,
    cache: RecencyCache,
    harvester: SegmentHarvester,
}

impl HarvestWorker {
    pub fn new(
        source: &str,
        client: Client,
        config: HarvestConfig,
        metrics: Arc<TransferMetrics>,
    ) -> Result<Self, HarvestError> {
        let manifest_url = Url::parse(source)
            .map_err(|e| HarvestError::invalid_url(source, e.to_string()))?;
        let cache = RecencyCache::new(config.cache_capacity);
        let harvester =
            SegmentHarvester::new(client.clone(), metrics, config.segment_download_timeout);
        Ok(Self {
            manifest_url,
            client,
            config,
            cache,
            harvester,
        })
    }

    pub async fn run(mut self, token: CancellationToken) -> Result<(), HarvestError> {
        info!(url = %self.manifest_url, "Starting harvest loop");
        let mut pacing = self.config.initial_cycle_interval;

        loop {
            if token.is_cancelled() {
                info!(url = %self.manifest_url, "Harvest loop cancelled");
                return Ok(());
            }

            let raw = fetch_playlist(
                &self.client,
                &self.manifest_url,
                self.config.playlist_fetch_timeout,
            )
            .await?;
            let content = std::str::from_utf8(&raw).map_err(|e| {
                HarvestError::playlist(format!("playlist content is not valid UTF-8: {e}"))
            })?;
            let repaired = repair_extinf_lines(content);
            let playlist = parse_media_playlist(repaired.as_bytes())?;
            debug!(
                segments = playlist.segments.len(),
                media_sequence = playlist.media_sequence,
                "Refreshed playlist"
            );

            for segment in &playlist.segments {
                match self
                    .harvester
                    .harvest_one(&self.manifest_url, segment, &mut self.cache)
                    .await
                {
                    // Every attempted segment updates pacing, even when its
                    // download failed: a failure is still evidence of the
                    // stream's cadence. Duplicates are not evidence of
                    // anything new.
                    HarvestOutcome::Downloaded { .. } | HarvestOutcome::Failed(_) => {
                        pacing = cycle_delay(f64::from(segment.duration), &self.config);
                    }
                    HarvestOutcome::Duplicate | HarvestOutcome::Unresolvable => {}
                }
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(url = %self.manifest_url, "Harvest loop cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(pacing) => {}
            }
        }
    }
}

// Segment harvesting: resolve, deduplicate, and drain one segment at a time.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use m3u8_rs::MediaSegment;
use reqwest::Client;
use tracing::{info, trace, warn};
use url::Url;

use crate::HarvestError;
use crate::cache::RecencyCache;
use crate::metrics::{TransferMetrics, format_bytes};

/// What happened to a single advertised segment.
#[derive(Debug)]
pub enum HarvestOutcome {
    /// Segment was new; its body was drained and counted.
    Downloaded { bytes: u64 },
    /// Segment URL is still in the recency cache, no request was made.
    Duplicate,
    /// Segment URI could not be resolved against the manifest URL.
    Unresolvable,
    /// Download was attempted and failed.
    Failed(HarvestError),
}

/// Downloads unseen segments and accounts for every byte transferred.
///
/// The body is streamed straight into the byte counter and discarded;
/// nothing is kept in memory beyond the chunk in flight.
#[derive(Debug)]
pub struct SegmentHarvester {
    client: Client,
    metrics: Arc<TransferMetrics>,
    download_timeout: Duration,
}

impl SegmentHarvester {
    pub fn new(client: Client, metrics: Arc<TransferMetrics>, download_timeout: Duration) -> Self {
        Self {
            client,
            metrics,
            download_timeout,
        }
    }

    /// Processes one advertised segment.
    ///
    /// A URI that fails to resolve is skipped with a warning; a failed
    /// download is counted and reported. Neither aborts the surrounding
    /// cycle, so the caller gets an outcome rather than an `Err`.
    pub async fn harvest_one(
        &self,
        manifest_url: &Url,
        segment: &MediaSegment,
        cache: &mut RecencyCache,
    ) -> HarvestOutcome {
        let segment_url = match manifest_url.join(&segment.uri) {
            Ok(url) => url,
            Err(e) => {
                warn!(uri = %segment.uri, error = %e, "Skipping segment with unresolvable URI");
                return HarvestOutcome::Unresolvable;
            }
        };

        if !cache.insert(segment_url.as_str()) {
            trace!(url = %segment_url, "Segment already seen, skipping");
            self.metrics.record_skip();
            return HarvestOutcome::Duplicate;
        }

        match self.download(&segment_url).await {
            Ok(bytes) => {
                let cumulative = self.metrics.record_download(bytes);
                info!(
                    "{} == {} == {}",
                    format_bytes(cumulative),
                    format_bytes(bytes),
                    segment_url
                );
                HarvestOutcome::Downloaded { bytes }
            }
            Err(e) => {
                self.metrics.record_download_error();
                warn!(url = %segment_url, error = %e, "Segment download failed");
                HarvestOutcome::Failed(e)
            }
        }
    }

    /// Streams the segment body to a counting sink, discarding the data.
    async fn download(&self, segment_url: &Url) -> Result<u64, HarvestError> {
        let response = self
            .client
            .get(segment_url.clone())
            .timeout(self.download_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HarvestError::http_status(
                response.status(),
                segment_url.as_str(),
                "segment download",
            ));
        }

        let mut stream = response.bytes_stream();
        let mut bytes_read: u64 = 0;
        while let Some(chunk) = stream.next().await {
            bytes_read += chunk?.len() as u64;
        }

        Ok(bytes_read)
    }
}

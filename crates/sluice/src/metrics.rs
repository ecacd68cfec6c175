use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Transfer accounting for the harvesting loop.
///
/// Lives for the whole process and is shared between the harvester and
/// anything that prints progress, so all counters use atomic operations.
/// Increments are additive and order-independent; `Relaxed` ordering is
/// sufficient and reads never observe a torn value.
#[derive(Debug, Default)]
pub struct TransferMetrics {
    /// Total bytes read from downloaded segments.
    pub bytes_total: AtomicU64,
    /// Number of segments downloaded.
    pub segments_downloaded: AtomicU64,
    /// Number of segments skipped as already seen.
    pub segments_skipped: AtomicU64,
    /// Number of segment downloads that failed.
    pub download_errors: AtomicU64,
}

impl TransferMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed segment download and return the new byte total.
    pub fn record_download(&self, bytes: u64) -> u64 {
        self.segments_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_total.fetch_add(bytes, Ordering::Relaxed) + bytes
    }

    /// Record a segment skipped by the dedup cache.
    pub fn record_skip(&self) {
        self.segments_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed segment download.
    pub fn record_download_error(&self) {
        self.download_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_total(&self) -> u64 {
        self.bytes_total.load(Ordering::Relaxed)
    }

    /// Get a point-in-time snapshot of all counter values.
    pub fn snapshot(&self) -> TransferSnapshot {
        TransferSnapshot {
            bytes_total: self.bytes_total.load(Ordering::Relaxed),
            segments_downloaded: self.segments_downloaded.load(Ordering::Relaxed),
            segments_skipped: self.segments_skipped.load(Ordering::Relaxed),
            download_errors: self.download_errors.load(Ordering::Relaxed),
        }
    }

    /// Log a transfer summary using tracing.
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        info!(
            bytes_total = snapshot.bytes_total,
            transferred = %format_bytes(snapshot.bytes_total),
            segments_downloaded = snapshot.segments_downloaded,
            segments_skipped = snapshot.segments_skipped,
            download_errors = snapshot.download_errors,
            "Transfer summary"
        );
    }
}

/// A point-in-time snapshot of all transfer counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSnapshot {
    pub bytes_total: u64,
    pub segments_downloaded: u64,
    pub segments_skipped: u64,
    pub download_errors: u64,
}

const KB: u64 = 1024;
const MB: u64 = 1024 * KB;
const GB: u64 = 1024 * MB;
const TB: u64 = 1024 * GB;

/// Format a byte count in human-readable form.
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= TB {
        format!("{:.2}TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2}GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2}MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2}KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes}B")
    }
}

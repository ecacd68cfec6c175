use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Configurable options for the harvesting loop.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Number of recently seen segment URLs kept for deduplication.
    /// Segments re-advertised beyond this window are fetched again.
    pub cache_capacity: usize,

    /// Scale applied to a segment's declared duration when computing the
    /// delay until the next playlist poll. Below 1.0 polls slightly ahead
    /// of real-time segment production so the live edge is never missed.
    pub pacing_factor: f64,

    /// Lower bound on the inter-cycle delay. Keeps a playlist that
    /// declares zero-length segments from turning the poll loop into a
    /// busy spin.
    pub min_cycle_interval: Duration,

    /// Delay used before the first segment duration has been observed.
    pub initial_cycle_interval: Duration,

    /// How long the supervisor waits after a worker failure before
    /// starting a fresh one.
    pub restart_cooldown: Duration,

    /// Timeout for a single playlist fetch.
    pub playlist_fetch_timeout: Duration,

    /// Timeout for a single segment download.
    pub segment_download_timeout: Duration,

    /// Connection timeout for the shared HTTP client.
    pub connect_timeout: Duration,

    /// User agent string sent with every request.
    pub user_agent: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 20,
            pacing_factor: 0.85,
            min_cycle_interval: Duration::from_millis(100),
            initial_cycle_interval: Duration::from_secs(5),
            restart_cooldown: Duration::from_secs(5),
            playlist_fetch_timeout: Duration::from_secs(15),
            segment_download_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

// Sluice: continuously drains a live HLS playlist to exercise a network path.
//
// Nothing is persisted; segments are downloaded exactly once each, counted,
// and discarded.

mod cache;
pub mod client;
pub mod config;
pub mod error;
mod harvester;
pub mod metrics;
mod playlist;
mod supervisor;
mod worker;

// Re-exports for easier access
pub use cache::RecencyCache;
pub use config::HarvestConfig;
pub use error::HarvestError;
pub use harvester::{HarvestOutcome, SegmentHarvester};
pub use metrics::{TransferMetrics, TransferSnapshot, format_bytes};
pub use playlist::{fetch_playlist, parse_media_playlist, repair_extinf_lines};
pub use supervisor::Supervisor;
pub use worker::{HarvestWorker, cycle_delay};

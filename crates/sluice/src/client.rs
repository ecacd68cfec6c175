use reqwest::Client;

use crate::HarvestError;
use crate::config::HarvestConfig;

/// Builds the HTTP client shared by playlist and segment fetches.
///
/// Per-request timeouts are applied at the call sites; the client itself
/// only carries connection-level settings so both fetch paths can reuse
/// pooled connections to the origin.
pub fn build_http_client(config: &HarvestConfig) -> Result<Client, HarvestError> {
    let client = Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.connect_timeout)
        .pool_max_idle_per_host(10)
        .build()?;
    Ok(client)
}

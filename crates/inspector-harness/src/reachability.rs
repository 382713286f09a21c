//! Reachability gate.
//!
//! Blocks until the host can reach the internet. Freshly started processes
//! may sit behind a firewall prompt for a while, so this polls instead of
//! trying once.

use std::time::Duration;

use hyper::{Request, Uri};
use tracing::{debug, info};

use crate::client::{empty_body, HttpClient};
use crate::error::HarnessError;

/// Delay between probes.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(1);

/// Wait for internet access, probing `probe_url` every [`PROBE_INTERVAL`].
pub async fn wait_for_internet(
    client: &HttpClient,
    probe_url: &str,
    timeout: Duration,
) -> Result<(), HarnessError> {
    wait_for_reachability(client, probe_url, timeout, PROBE_INTERVAL).await
}

/// Probe `probe_url` until any HTTP response comes back or `timeout` elapses.
///
/// Never blocks longer than `timeout`: an in-flight probe is abandoned when
/// the deadline hits.
pub async fn wait_for_reachability(
    client: &HttpClient,
    probe_url: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<(), HarnessError> {
    let uri: Uri = probe_url.parse().map_err(|e| HarnessError::InvalidUrl {
        url: probe_url.to_string(),
        reason: format!("{e}"),
    })?;

    let poll = async {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match probe(client, &uri).await {
                Ok(status) => {
                    info!(
                        "Internet access confirmed via {} (status {}, attempt {})",
                        uri, status, attempt
                    );
                    return;
                }
                Err(e) => debug!("Reachability probe {} to {} failed: {}", attempt, uri, e),
            }
            tokio::time::sleep(interval).await;
        }
    };

    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| HarnessError::InternetTimeout(timeout))
}

async fn probe(client: &HttpClient, uri: &Uri) -> Result<u16, HarnessError> {
    let req = Request::get(uri.clone()).body(empty_body())?;
    let response = client.request(req).await?;
    Ok(response.status().as_u16())
}

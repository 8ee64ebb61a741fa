//! Preflight check that the application under test is answering

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::error::{FlowError, FlowResult};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Poll `base_url` until it returns any HTTP response or `timeout` elapses
pub async fn wait_for_reachable(base_url: &str, timeout: Duration) -> FlowResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match client.get(base_url).send().await {
            Ok(resp) => {
                if resp.status().is_server_error() {
                    warn!("{} answered {}", base_url, resp.status());
                }
                info!("{} is reachable", base_url);
                return Ok(());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", base_url);
                }
                // Connection refused is expected while the app is starting
                if !e.is_connect() {
                    warn!("Preflight error: {}", e);
                }
            }
        }

        if start.elapsed() + POLL_INTERVAL > timeout {
            break;
        }
        sleep(POLL_INTERVAL).await;
    }

    Err(FlowError::Unreachable {
        url: base_url.to_string(),
        attempts,
    })
}

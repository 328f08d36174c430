use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Target endpoint for the outbound reachability check.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

/// Cheap outbound reachability check: one TCP connect to a well-known
/// endpoint (a public DNS resolver by default).
///
/// Returns true only on a successful connect; timeout, refusal and
/// resolution failures all come back as false, never as an error.
pub async fn reachable(config: &ProbeConfig) -> bool {
    let address = format!("{}:{}", config.host, config.port);
    match tokio::time::timeout(config.timeout, TcpStream::connect(&address)).await {
        Ok(Ok(_)) => {
            debug!(%address, "connectivity probe succeeded");
            true
        }
        Ok(Err(e)) => {
            warn!(%address, error = %e, "connectivity probe failed");
            false
        }
        Err(_) => {
            warn!(%address, timeout = ?config.timeout, "connectivity probe timed out");
            false
        }
    }
}

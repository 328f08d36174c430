use anyhow::{Result, bail};

/// Parse a broker URL in format `mqtt://host:port`, `tcp://host:port` or
/// bare `host[:port]`; the port defaults to 1883.
pub fn parse_broker_url(url: &str) -> Result<(&str, u16)> {
    let url = url.trim_start_matches("mqtt://");
    let url = url.trim_start_matches("tcp://");

    let parts: Vec<&str> = url.split(':').collect();
    match parts.len() {
        1 => Ok((parts[0], 1883)),
        2 => {
            let Ok(port) = parts[1].parse::<u16>() else {
                bail!("invalid port in broker URL: {}", parts[1]);
            };
            Ok((parts[0], port))
        }
        _ => bail!("invalid broker URL format: {}", url),
    }
}

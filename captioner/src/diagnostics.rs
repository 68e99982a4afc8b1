use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, error};

const IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";
const IP_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Returned when the public IP cannot be determined.
pub const UNKNOWN_IP: &str = "unknown";

#[derive(Deserialize)]
struct IpResponse {
    ip: Option<String>,
}

/// Public IP of this host as seen by the provider, for log context.
///
/// Never fails: any error is logged and yields [`UNKNOWN_IP`].
pub async fn public_ip(client: &reqwest::Client) -> String {
    lookup_ip(client, IP_LOOKUP_URL).await
}

pub(crate) async fn lookup_ip(client: &reqwest::Client, url: &str) -> String {
    let response = match client.get(url).timeout(IP_LOOKUP_TIMEOUT).send().await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "error while retrieving public IP");
            return UNKNOWN_IP.to_string();
        }
    };

    if !response.status().is_success() {
        error!(status = %response.status(), "failed to get public IP");
        return UNKNOWN_IP.to_string();
    }

    match response.json::<IpResponse>().await {
        Ok(IpResponse { ip: Some(ip) }) => {
            debug!(%ip, "public IP");
            ip
        }
        Ok(IpResponse { ip: None }) => UNKNOWN_IP.to_string(),
        Err(e) => {
            error!(error = %e, "unreadable public IP response");
            UNKNOWN_IP.to_string()
        }
    }
}

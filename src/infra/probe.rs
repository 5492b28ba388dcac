//! Usage: Reachability probe for the settings API, backing the system-health view.

use std::time::{Duration, Instant};

use crate::domain::validate;

/// What one probe round trip observed. Any completed response counts as
/// reachable, including 4xx/5xx; the status lets the health view tell a
/// reachable-but-unhealthy API apart from one that is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub latency_ms: u64,
    pub status: u16,
}

/// Round-trips `/settings/{key}` and reports latency plus the HTTP status.
///
/// Tries HEAD first (cheap, no body); some servers reject HEAD, so fall back
/// to GET before reporting the endpoint unreachable.
pub async fn probe_settings(
    client: &reqwest::Client,
    base_url: &str,
    key: &str,
    timeout: Duration,
) -> Result<ProbeReport, String> {
    validate::validate_resource_key(key)?;

    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err("base_url is required".to_string());
    }
    let mut url =
        reqwest::Url::parse(base_url).map_err(|e| format!("invalid base_url={base_url}: {e}"))?;
    // Url::join drops the last path segment unless the base ends with `/`.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    let url = url
        .join(&format!("settings/{key}"))
        .map_err(|e| format!("invalid settings url for `{key}`: {e}"))?;

    let started = Instant::now();

    if let Ok(response) = client.head(url.clone()).timeout(timeout).send().await {
        return Ok(ProbeReport {
            latency_ms: started.elapsed().as_millis() as u64,
            status: response.status().as_u16(),
        });
    }

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| format!("probe failed: {e}"))?;

    Ok(ProbeReport {
        latency_ms: started.elapsed().as_millis() as u64,
        status: response.status().as_u16(),
    })
}

//! HTTP retrieval of sensor readings from the monitoring backend.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};
use tracing::debug;

/// Backend endpoint listing a sensor's readings over the last `range_hours`.
pub fn readings_url(base_url: &str, sensor_id: &str, range_hours: u32) -> String {
    format!(
        "{}/sensors/{}/readings/?range={}",
        base_url.trim_end_matches('/'),
        sensor_id,
        range_hours
    )
}

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let mut req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    req.headers_mut().insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("backend returned status {}: {}", status, body);
    }

    let bytes = resp.bytes().await?.to_vec();
    debug!(url, bytes = bytes.len(), "Response received");
    Ok(bytes)
}

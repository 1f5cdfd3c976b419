//! Loading the schedule document from a URL or the local filesystem.

mod basic;
mod client;

pub use basic::{BasicClient, DEFAULT_TIMEOUT};
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// GETs `url` and returns the body. Non-success statuses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    debug!(status = %resp.status(), "Schedule response received");
    Ok(resp.bytes().await?.to_vec())
}

/// Fetches `source` over HTTP when it looks like a URL, otherwise reads it
/// from disk.
#[tracing::instrument(skip(client))]
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if is_url(source) {
        fetch_bytes(client, source)
            .await
            .with_context(|| format!("failed to fetch {source}"))?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read {source}"))?
    };
    info!(bytes = bytes.len(), "Schedule document loaded");
    Ok(bytes)
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

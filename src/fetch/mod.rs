//! Retrieval of the raw dataset bytes from a local path or an HTTP(S) URL.

mod auth;
mod basic;
mod client;

pub use auth::BearerToken;
pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use tracing::debug;

pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads dataset bytes from a local file path or fetches them over HTTP,
/// sending `token` as a bearer token when given.
#[tracing::instrument(skip(token), fields(authenticated = token.is_some()))]
pub async fn read_source(source: &str, token: Option<&str>) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        let client = BasicClient::new()?;
        match token {
            Some(token) => fetch_bytes(&BearerToken::new(client, token)?, source).await?,
            None => fetch_bytes(&client, source).await?,
        }
    } else {
        tokio::fs::read(source)
            .await
            .with_context(|| format!("failed to read dataset '{source}'"))?
    };
    debug!(bytes = bytes.len(), "Dataset bytes loaded");
    Ok(bytes)
}

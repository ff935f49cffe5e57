//! HTTP plumbing shared by the transit API and report clients.

mod basic;
mod client;
mod error;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use error::FetchError;

use tracing::debug;

/// GETs `url` and parses the body as JSON.
///
/// Non-2xx responses become [`FetchError::Http`] carrying the status and the
/// response body; the body is never parsed in that case.
#[tracing::instrument(skip_all, fields(url = %url))]
pub async fn fetch_json<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<serde_json::Value, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await.map_err(|source| FetchError::Network {
        url: url.to_string(),
        source,
    })?;

    let status = resp.status();
    let bytes = resp.bytes().await.map_err(|source| FetchError::Network {
        url: url.to_string(),
        source,
    })?;

    if !status.is_success() {
        return Err(FetchError::Http {
            url: url.to_string(),
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    debug!(bytes = bytes.len(), %status, "Response received");

    serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

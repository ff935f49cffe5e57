use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};

/// Header the MBTA v3 API reads its key from.
pub const MBTA_KEY_HEADER: &str = "x-api-key";

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header name and value are validated once at construction, so a bad
/// key surfaces at startup rather than on every request.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiKeyError {
    #[error("invalid header name: {0}")]
    Name(#[from] InvalidHeaderName),
    #[error("api key is not a valid header value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, ApiKeyError> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())?;
        let mut key = HeaderValue::from_str(key)?;
        key.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// `x-api-key: <key>`, as the MBTA API expects.
    pub fn mbta(inner: C, key: &str) -> Result<Self, ApiKeyError> {
        Self::new(inner, MBTA_KEY_HEADER, key)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the headers of the last request instead of sending it.
    struct Recorder(Mutex<Option<reqwest::header::HeaderMap>>);

    #[async_trait]
    impl HttpClient for Recorder {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            *self.0.lock().unwrap() = Some(req.headers().clone());
            Ok(http::Response::new("{}").into())
        }
    }

    #[tokio::test]
    async fn test_injects_mbta_header() {
        let client = ApiKey::mbta(Recorder(Mutex::new(None)), "secret").unwrap();
        let req = reqwest::Request::new(
            reqwest::Method::GET,
            "https://api-v3.mbta.com/alerts".parse().unwrap(),
        );
        client.execute(req).await.unwrap();

        let headers = client.inner.0.lock().unwrap().clone().unwrap();
        assert_eq!(headers.get("x-api-key").unwrap(), "secret");
    }

    #[test]
    fn test_rejects_key_with_newline() {
        let result = ApiKey::mbta(Recorder(Mutex::new(None)), "bad\nkey");
        assert!(matches!(result, Err(ApiKeyError::Value(_))));
    }
}

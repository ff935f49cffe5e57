use reqwest::StatusCode;

/// Failure modes of a single upstream request.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout and friends.
    #[error("network error requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered, but not with a 2xx.
    #[error("{url} returned status {status}: {body}")]
    Http {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// The body was not the JSON we asked for.
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// HTTP status code, when the failure came from a non-2xx response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

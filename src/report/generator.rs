use crate::config::ReportConfig;
use crate::fetch::{BasicClient, HttpClient};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The text-generation service could not produce a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report service unavailable: {0}")]
    Unavailable(String),
}

/// Prompt in, prose out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ReportError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Talks to a local Ollama server's `/api/generate`.
pub struct OllamaClient<C> {
    http: C,
    endpoint: String,
    model: String,
    num_predict: u32,
}

impl OllamaClient<BasicClient> {
    pub fn from_config(config: &ReportConfig) -> reqwest::Result<Self> {
        Ok(Self::new(BasicClient::new(config.timeout)?, config))
    }
}

impl<C: HttpClient> OllamaClient<C> {
    pub fn new(http: C, config: &ReportConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            num_predict: config.num_predict,
        }
    }
}

#[async_trait]
impl<C: HttpClient> TextGenerator for OllamaClient<C> {
    async fn generate(&self, prompt: &str) -> Result<String, ReportError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = serde_json::to_vec(&GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: self.num_predict,
            },
        })
        .map_err(|e| ReportError::Unavailable(format!("could not encode request: {e}")))?;

        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| ReportError::Unavailable(format!("invalid endpoint {url}: {e}")))?;
        let mut req = reqwest::Request::new(reqwest::Method::POST, parsed);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(body.into());

        let resp = self.http.execute(req).await.map_err(|e| {
            if e.is_timeout() {
                ReportError::Unavailable("timed out".to_string())
            } else {
                ReportError::Unavailable(e.to_string())
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ReportError::Unavailable(format!("status {status}: {body}")));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ReportError::Unavailable(format!("unexpected response: {e}")))?;
        debug!(chars = parsed.response.len(), model = %self.model, "Report generated");
        Ok(parsed.response.trim().to_string())
    }
}

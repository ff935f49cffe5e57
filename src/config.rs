//! Process configuration, read once from the environment at startup.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api-v3.mbta.com";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "gemma3";

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub report: ReportConfig,
    pub bind_addr: SocketAddr,
}

#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Optional; without it requests are unauthenticated and rate limited.
    pub api_key: Option<String>,
    /// Values for `filter[activity]` on the alerts request.
    pub alert_activities: Vec<String>,
    pub timeout: Duration,
}

// Keeps the key out of logs.
impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("alert_activities", &self.alert_activities)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub endpoint: String,
    pub model: String,
    pub num_predict: u32,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
                api_key: None,
                alert_activities: vec!["USING_WHEELCHAIR".to_string()],
                timeout: Duration::from_secs(30),
            },
            report: ReportConfig {
                endpoint: DEFAULT_OLLAMA_URL.to_string(),
                model: DEFAULT_OLLAMA_MODEL.to_string(),
                num_predict: 200,
                timeout: Duration::from_secs(30),
            },
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl Config {
    /// Reads the process environment. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(base) = get("MBTA_API_BASE_URL") {
            config.api.base_url = base.trim_end_matches('/').to_string();
        }
        config.api.api_key = get("MBTA_API_KEY");
        if let Some(list) = get("MBTA_ALERT_ACTIVITIES") {
            config.api.alert_activities = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(secs) = get("HTTP_TIMEOUT_SECS") {
            config.api.timeout = Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS", &secs)?);
        }

        if let Some(url) = get("OLLAMA_URL") {
            config.report.endpoint = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            config.report.model = model;
        }
        if let Some(n) = get("OLLAMA_NUM_PREDICT") {
            config.report.num_predict = parse_var("OLLAMA_NUM_PREDICT", &n)?;
        }
        if let Some(secs) = get("REPORT_TIMEOUT_SECS") {
            config.report.timeout = Duration::from_secs(parse_var("REPORT_TIMEOUT_SECS", &secs)?);
        }

        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = parse_var("BIND_ADDR", &addr)?;
        }

        Ok(config)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{name} has an invalid value: '{raw}'"))
}

use super::Snapshot;
use super::document::{self, AlertAttributes};
use crate::config::ApiConfig;
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, FetchError, HttpClient, fetch_json};
use crate::model::ServiceAlert;
use crate::reconcile::normalize_alert;
use anyhow::{Context, Result};
use reqwest::Url;
use serde_json::Value;
use tracing::{info, warn};

/// Route-level alert effects worth mentioning in a station briefing.
/// Per-train delays are left out as too transient.
pub const SERVICE_EFFECTS: &[&str] = &[
    "SHUTTLE",
    "SUSPENSION",
    "DETOUR",
    "SERVICE_CHANGE",
    "STOP_CLOSURE",
    "STOP_MOVE",
    "STATION_ISSUE",
];

const FACILITY_TYPES: &str = "ELEVATOR,ESCALATOR";

pub struct MbtaClient<C> {
    http: C,
    base_url: String,
    alert_activities: String,
}

impl MbtaClient<Box<dyn HttpClient>> {
    /// Builds a client from configuration, adding the API key header when a
    /// key is configured.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let basic = BasicClient::new(config.timeout).context("building HTTP client")?;
        let http: Box<dyn HttpClient> = match &config.api_key {
            Some(key) => Box::new(ApiKey::mbta(basic, key).context("MBTA_API_KEY is unusable")?),
            None => {
                warn!("MBTA_API_KEY not set, requests will be rate limited");
                Box::new(basic)
            }
        };
        Ok(Self::new(http, &config.base_url, &config.alert_activities))
    }
}

impl<C: HttpClient> MbtaClient<C> {
    pub fn new(http: C, base_url: &str, alert_activities: &[String]) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            alert_activities: alert_activities.join(","),
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let raw = format!("{}/{}", self.base_url, path);
        Url::parse_with_params(&raw, params).map_err(|e| FetchError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    /// Elevators and escalators, with their stops in `included`.
    pub async fn fetch_facilities(&self) -> Result<Value, FetchError> {
        let url = self.url(
            "facilities",
            &[("filter[type]", FACILITY_TYPES), ("include", "stop")],
        )?;
        fetch_json(&self.http, url.as_str()).await
    }

    /// Alerts affecting riders with the configured activities.
    pub async fn fetch_accessibility_alerts(&self) -> Result<Value, FetchError> {
        let url = self.url("alerts", &[("filter[activity]", self.alert_activities.as_str())])?;
        fetch_json(&self.http, url.as_str()).await
    }

    /// Both documents, fetched concurrently. Either failure fails the whole
    /// snapshot; there is no partial result.
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
        let (facilities, alerts) =
            tokio::try_join!(self.fetch_facilities(), self.fetch_accessibility_alerts())?;
        info!("Fetched facilities and alerts");
        Ok(Snapshot { facilities, alerts })
    }

    /// High-impact service alerts on the routes serving `stop_id`.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_route_alerts(&self, stop_id: &str) -> Result<Vec<ServiceAlert>, FetchError> {
        let url = self.url("routes", &[("filter[stop]", stop_id)])?;
        let routes = fetch_json(&self.http, url.as_str()).await?;
        let route_ids: Vec<String> = document::records::<Value>(&routes, "data")
            .into_iter()
            .map(|r| r.id)
            .collect();
        if route_ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = route_ids.join(",");
        let url = self.url("alerts", &[("filter[route]", joined.as_str())])?;
        let alerts = fetch_json(&self.http, url.as_str()).await?;
        let kept = service_alerts_for_stop(&alerts, stop_id);
        info!(routes = route_ids.len(), service_alerts = kept.len(), "Fetched route alerts");
        Ok(kept)
    }
}

/// Keeps alerts with a [`SERVICE_EFFECTS`] effect. `STATION_ISSUE` alerts
/// usually concern some other station on the line, so they are kept only
/// when one of their informed entities is `stop_id`.
pub(crate) fn service_alerts_for_stop(alerts_doc: &Value, stop_id: &str) -> Vec<ServiceAlert> {
    document::records::<AlertAttributes>(alerts_doc, "data")
        .into_iter()
        .filter_map(|record| {
            let effect = record.attributes.effect.clone()?;
            if !SERVICE_EFFECTS.contains(&effect.as_str()) {
                return None;
            }
            if effect == "STATION_ISSUE"
                && !record
                    .attributes
                    .informed_entity
                    .iter()
                    .any(|e| e.stop.as_deref() == Some(stop_id))
            {
                return None;
            }
            let alert = normalize_alert(record);
            Some(ServiceAlert {
                id: alert.id,
                header: alert.header.unwrap_or_default(),
                effect,
                description: alert
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                active_periods: alert.active_periods,
            })
        })
        .collect()
}

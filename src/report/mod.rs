//! Best-effort natural-language station briefings.
//!
//! Nothing here can fail the caller: every problem ends up as
//! [`ReportOutcome::Unavailable`].

mod generator;
pub mod prompt;
pub mod selection;

pub use generator::{OllamaClient, ReportError, TextGenerator};
pub use selection::{Selection, Ticket};

use crate::fetch::HttpClient;
use crate::mbta::MbtaClient;
use crate::model::{AccessibilityView, Facility, Station};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

pub const UNAVAILABLE_MESSAGE: &str = "AI report unavailable right now.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    Ready { text: String },
    Unavailable { reason: String },
}

impl ReportOutcome {
    /// Text to show in the report region of the UI.
    pub fn display_text(&self) -> &str {
        match self {
            ReportOutcome::Ready { text } => text,
            ReportOutcome::Unavailable { .. } => UNAVAILABLE_MESSAGE,
        }
    }
}

/// Generates the briefing for `station`.
///
/// Route alerts are fetched for context; if that fails the report is still
/// attempted without them.
#[tracing::instrument(skip_all, fields(station_id = %station.id))]
pub async fn station_report<C, G>(
    mbta: &MbtaClient<C>,
    generator: &G,
    view: &AccessibilityView,
    station: &Station,
) -> ReportOutcome
where
    C: HttpClient,
    G: TextGenerator + ?Sized,
{
    let service_alerts = match mbta.fetch_route_alerts(&station.id).await {
        Ok(alerts) => alerts,
        Err(e) => {
            warn!(error = %e, "Route alerts unavailable, reporting without them");
            Vec::new()
        }
    };

    let facilities: Vec<&Facility> = view.facilities_at(&station.id).collect();
    let prompt = prompt::build_station_prompt(&station.name, &facilities, &service_alerts, Utc::now());

    match generator.generate(&prompt).await {
        Ok(text) => {
            info!(chars = text.len(), "Station report ready");
            ReportOutcome::Ready { text }
        }
        Err(e) => {
            warn!(error = %e, "Station report unavailable");
            ReportOutcome::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

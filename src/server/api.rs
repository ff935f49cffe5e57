use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::AppState;
use super::error::{RouteErrorResponse, RouteResult};
use crate::format::relative_duration_opt;
use crate::model::{
    AccessibilityView, Facility, FacilityKind, FacilityStatus, Station, StatusClass, SystemSummary,
    WheelchairBoarding,
};
use crate::reconcile::reconcile_snapshot;
use crate::report::{self, ReportOutcome};

pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/status", get(status))
        .route("/stations/:id", get(station_detail))
        .route("/stations/:id/report", get(station_report))
        .with_state(state)
}

async fn ping() -> impl IntoResponse {
    Json(json!({
        "message": "pong!"
    }))
}

#[derive(Debug, Serialize)]
pub struct StationDto {
    pub id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub wheelchair_boarding: WheelchairBoarding,
    pub n_operational: usize,
    pub n_out_of_service: usize,
    pub classification: StatusClass,
}

impl From<&Station> for StationDto {
    fn from(s: &Station) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            latitude: s.latitude,
            longitude: s.longitude,
            wheelchair_boarding: s.wheelchair_boarding,
            n_operational: s.n_operational,
            n_out_of_service: s.n_out_of_service,
            classification: s.classification(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusDto {
    pub generated_at: DateTime<Utc>,
    pub summary: SystemSummary,
    pub stations: Vec<StationDto>,
}

#[derive(Debug, Serialize)]
pub struct AlertEntry {
    pub id: String,
    pub header: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub cause: Option<String>,
    pub effect: Option<String>,
    pub outage_start: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    /// e.g. "3 days"
    pub down_for: Option<String>,
    pub updated_ago: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FacilityEntry {
    pub id: String,
    pub kind: FacilityKind,
    pub name: String,
    pub short_name: Option<String>,
    pub status: FacilityStatus,
    pub alert: Option<AlertEntry>,
}

impl FacilityEntry {
    fn new(facility: &Facility, now: DateTime<Utc>) -> Self {
        Self {
            id: facility.id.clone(),
            kind: facility.kind,
            name: facility.display_name().to_string(),
            short_name: facility.short_name.clone(),
            status: facility.status,
            alert: facility.alert.as_ref().map(|a| AlertEntry {
                id: a.id.clone(),
                header: a.header.clone(),
                description: a.description.clone(),
                severity: a.severity.clone(),
                cause: a.cause.clone(),
                effect: a.effect.clone(),
                outage_start: a.outage_start,
                updated_at: a.updated_at,
                down_for: relative_duration_opt(a.outage_start.as_ref(), now),
                updated_ago: relative_duration_opt(a.updated_at.as_ref(), now),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StationDetailDto {
    pub station: StationDto,
    /// Out-of-service first, then by id.
    pub facilities: Vec<FacilityEntry>,
}

#[derive(Debug, Serialize)]
pub struct ReportDto {
    pub station_id: String,
    #[serde(flatten)]
    pub outcome: ReportOutcome,
    pub display_text: String,
}

async fn load_view(state: &AppState) -> RouteResult<AccessibilityView> {
    let snapshot = state.mbta.fetch_snapshot().await.map_err(|e| {
        warn!(error = %e, "Fetch failed, no data to serve");
        RouteErrorResponse::from(e)
    })?;
    Ok(reconcile_snapshot(&snapshot))
}

async fn status(State(state): State<AppState>) -> RouteResult<Json<StatusDto>> {
    let view = load_view(&state).await?;
    Ok(Json(StatusDto {
        generated_at: Utc::now(),
        summary: view.summary(),
        stations: view.stations.iter().map(StationDto::from).collect(),
    }))
}

async fn station_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> RouteResult<Json<StationDetailDto>> {
    let view = load_view(&state).await?;
    let station = view
        .station(&id)
        .ok_or_else(|| RouteErrorResponse::not_found(format!("Station '{id}'")))?;

    let now = Utc::now();
    let mut facilities: Vec<FacilityEntry> = view
        .facilities_at(&station.id)
        .map(|f| FacilityEntry::new(f, now))
        .collect();
    facilities.sort_by(|a, b| {
        (b.status == FacilityStatus::OutOfService)
            .cmp(&(a.status == FacilityStatus::OutOfService))
            .then_with(|| a.id.cmp(&b.id))
    });

    Ok(Json(StationDetailDto {
        station: StationDto::from(station),
        facilities,
    }))
}

/// Always answers 200 for a known station; generation problems come back as
/// an `unavailable` outcome so the page can show them in the report region.
async fn station_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> RouteResult<Json<ReportDto>> {
    let outcome = match state.mbta.fetch_snapshot().await {
        Ok(snapshot) => {
            let view = reconcile_snapshot(&snapshot);
            let station = view
                .station(&id)
                .ok_or_else(|| RouteErrorResponse::not_found(format!("Station '{id}'")))?;
            report::station_report(state.mbta.as_ref(), state.reports.as_ref(), &view, station).await
        }
        Err(e) => {
            warn!(error = %e, "Fetch failed, report unavailable");
            ReportOutcome::Unavailable {
                reason: e.to_string(),
            }
        }
    };

    Ok(Json(ReportDto {
        station_id: id,
        display_text: outcome.display_text().to_string(),
        outcome,
    }))
}

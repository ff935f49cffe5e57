//! Console rendering and CSV persistence of reconciled views.
//!
//! Supports a plain-text status summary, JSON, and appending per-station
//! snapshot rows to a CSV file for historical tracking.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::format::relative_duration_opt;
use crate::model::{AccessibilityView, Station, StatusClass};

const RULE: &str = "============================================================";

/// One station at one point in time.
#[derive(Debug, Serialize)]
pub struct SnapshotRow<'a> {
    pub timestamp: DateTime<Utc>,
    pub station_id: &'a str,
    pub station_name: &'a str,
    pub n_operational: usize,
    pub n_out_of_service: usize,
    pub classification: StatusClass,
}

/// Renders the system summary followed by outages grouped by station.
pub fn render_status(view: &AccessibilityView) -> String {
    let summary = view.summary();
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "MBTA ACCESSIBILITY STATUS");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Total facilities: {}", summary.total_facilities);
    let _ = writeln!(
        out,
        "Operational: {}",
        summary.total_facilities - summary.total_out_of_service
    );
    let _ = writeln!(out, "Out of service: {}", summary.total_out_of_service);
    let _ = writeln!(
        out,
        "Stations with outages: {} of {}",
        summary.stations_with_outages, summary.total_stations
    );
    let _ = writeln!(out, "{RULE}");

    let outages = view.outages_by_station();
    if outages.is_empty() {
        let _ = writeln!(out, "\nNo current outages!");
        return out;
    }

    let _ = writeln!(out, "\nCURRENT OUTAGES:");
    let _ = writeln!(out, "{}", "-".repeat(RULE.len()));
    for (station, facilities) in outages {
        let _ = writeln!(out, "\n{station}:");
        for f in facilities {
            let severity = f
                .alert
                .as_ref()
                .and_then(|a| a.severity.as_deref())
                .unwrap_or("?");
            let _ = writeln!(
                out,
                "  [{severity}] {}: {}",
                f.kind.label(),
                f.short_name.as_deref().unwrap_or(&f.id)
            );
            if let Some(cause) = f.alert.as_ref().and_then(|a| a.cause.as_deref()) {
                let _ = writeln!(out, "      Cause: {cause}");
            }
        }
    }
    out
}

/// Renders one station's facilities, out-of-service units first.
pub fn render_station(view: &AccessibilityView, station: &Station, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}): {} operational, {} out of service [{}]",
        station.name,
        station.id,
        station.n_operational,
        station.n_out_of_service,
        station.classification().label()
    );

    let mut facilities: Vec<_> = view.facilities_at(&station.id).collect();
    facilities.sort_by_key(|f| (!f.is_out_of_service(), f.id.clone()));

    for f in facilities {
        let status = if f.is_out_of_service() {
            "OUT OF SERVICE"
        } else {
            "operational"
        };
        let _ = writeln!(out, "  {} {}: {status}", f.kind.label(), f.display_name());
        let Some(alert) = &f.alert else { continue };
        if let Some(header) = &alert.header {
            let _ = writeln!(out, "      {header}");
        }
        let mut meta = Vec::new();
        if let Some(down) = relative_duration_opt(alert.outage_start.as_ref(), now) {
            meta.push(format!("down {down}"));
        }
        if let Some(updated) = relative_duration_opt(alert.updated_at.as_ref(), now) {
            meta.push(format!("updated {updated} ago"));
        }
        if !meta.is_empty() {
            let _ = writeln!(out, "      ({})", meta.join(", "));
        }
    }
    out
}

/// Serializes the view as pretty JSON.
pub fn render_json(view: &AccessibilityView) -> Result<String> {
    Ok(serde_json::to_string_pretty(view)?)
}

/// Appends one row per station to the CSV at `path`.
///
/// Creates the file with headers if it does not already exist.
pub fn append_snapshot(path: &str, view: &AccessibilityView, now: DateTime<Utc>) -> Result<usize> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending snapshot rows");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // headers only on a fresh file
        .from_writer(file);

    for station in &view.stations {
        writer.serialize(SnapshotRow {
            timestamp: now,
            station_id: &station.id,
            station_name: &station.name,
            n_operational: station.n_operational,
            n_out_of_service: station.n_out_of_service,
            classification: station.classification(),
        })?;
    }
    writer.flush()?;

    Ok(view.stations.len())
}

//! Prompt construction for station briefings.

use crate::format::relative_duration_opt;
use crate::model::{Facility, FacilityKind, ServiceAlert};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Service alert descriptions are cut to this many characters.
const SERVICE_DETAIL_LIMIT: usize = 300;

/// Short handle such as `"elevator 876"`, the form MBTA detour text uses
/// when pointing riders at another unit.
fn facility_handle(facility: &Facility) -> String {
    format!("{} {}", facility.kind.label().to_lowercase(), facility.id)
}

fn facility_line(
    facility: &Facility,
    out_of_service: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> String {
    let status = if facility.is_out_of_service() {
        "OUT OF SERVICE"
    } else {
        "OPERATIONAL"
    };
    let mut line = format!(
        "- {} \"{}\": {}",
        facility.kind.label(),
        facility.display_name(),
        status
    );

    let Some(alert) = facility.alert.as_ref().filter(|_| facility.is_out_of_service()) else {
        return line;
    };

    if let Some(down) = relative_duration_opt(alert.outage_start.as_ref(), now) {
        line.push_str(&format!(" (down {down})"));
    }
    if let Some(cause) = alert.cause.as_deref().filter(|c| !c.is_empty()) {
        line.push_str(&format!("\n  Cause: {cause}"));
    }
    if let Some(header) = alert.header.as_deref().filter(|h| !h.is_empty()) {
        line.push_str(&format!("\n  Alert: {header}"));
    }
    let description = alert.description.as_deref().map(str::trim).unwrap_or("");
    if !description.is_empty() {
        line.push_str(&format!("\n  MBTA instructions: {description}"));

        let lowered = description.to_lowercase();
        let own = facility_handle(facility);
        if let Some(other) = out_of_service
            .iter()
            .find(|handle| **handle != own && lowered.contains(handle.as_str()))
        {
            line.push_str(&format!(
                "\n  WARNING: These instructions reference {other} which is ALSO out of service."
            ));
        }
    }
    line
}

fn service_block(service_alerts: &[ServiceAlert]) -> String {
    if service_alerts.is_empty() {
        return "(none)".to_string();
    }
    service_alerts
        .iter()
        .map(|sa| {
            let mut line = format!("- [{}] {}", sa.effect, sa.header);
            if let Some(details) = sa.description.as_deref() {
                let cut: String = details.chars().take(SERVICE_DETAIL_LIMIT).collect();
                line.push_str(&format!("\n  Details: {cut}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Builds the briefing prompt for one station.
pub fn build_station_prompt(
    station_name: &str,
    facilities: &[&Facility],
    service_alerts: &[ServiceAlert],
    now: DateTime<Utc>,
) -> String {
    let count = |kind: FacilityKind, out_only: bool| {
        facilities
            .iter()
            .filter(|f| f.kind == kind && (!out_only || f.is_out_of_service()))
            .count()
    };
    let n_elevators = count(FacilityKind::Elevator, false);
    let n_escalators = count(FacilityKind::Escalator, false);
    let elevators_out = count(FacilityKind::Elevator, true);
    let escalators_out = count(FacilityKind::Escalator, true);

    let out_of_service: BTreeSet<String> = facilities
        .iter()
        .filter(|f| f.is_out_of_service())
        .map(|f| facility_handle(f))
        .collect();

    let facilities_block = if facilities.is_empty() {
        "(none)".to_string()
    } else {
        facilities
            .iter()
            .map(|f| facility_line(f, &out_of_service, now))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "I rely on escalators and elevators and I'm about to travel through {station_name} \
         station. Give me a quick travel briefing based on this data.\n\n\
         Elevators: {n_elevators} ({elevators_out} out) | \
         Escalators: {n_escalators} ({escalators_out} out)\n\n\
         Facilities:\n{facilities_block}\n\n\
         Service alerts:\n{services}\n\n\
         In one short paragraph (3-5 sentences), tell me:\n\
         1. Whether I can get from street to platform by elevator right now.\n\
         2. If not, what exactly I should do instead. Use specific stop names, \
         bus routes, and distances from the MBTA instructions above. If any \
         instructions have a WARNING, skip them and use a working alternative.\n\
         3. Any service disruptions (shuttles, closures) that affect my trip.\n\n\
         Only use the data above. Write as if talking directly to me. \
         Start with the key information immediately, with no greeting or preamble.",
        services = service_block(service_alerts),
    )
}

//! Joins facility and alert documents into an [`AccessibilityView`].

use crate::mbta::Snapshot;
use crate::mbta::document::{self, AlertAttributes, FacilityAttributes, Record, StopAttributes};
use crate::model::{
    AccessibilityView, ActivePeriod, Alert, Facility, FacilityKind, FacilityStatus, Station,
    WheelchairBoarding,
};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const UNKNOWN_STATION: &str = "Unknown";

struct StopInfo {
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    wheelchair_boarding: WheelchairBoarding,
}

/// Reconciles a fetched [`Snapshot`].
pub fn reconcile_snapshot(snapshot: &Snapshot) -> AccessibilityView {
    reconcile(&snapshot.facilities, &snapshot.alerts)
}

/// Builds the per-facility and per-station view from the raw facilities
/// document (with included stops) and the alerts document.
///
/// Pure and deterministic: the same documents always give the same view,
/// whatever order the alerts arrive in.
pub fn reconcile(facilities_doc: &Value, alerts_doc: &Value) -> AccessibilityView {
    let stops = stop_lookup(facilities_doc);
    let mut facilities = facility_inventory(facilities_doc);

    let alerts: Vec<Alert> = document::records::<AlertAttributes>(alerts_doc, "data")
        .into_iter()
        .map(normalize_alert)
        .collect();

    let mut unmatched = 0usize;
    for alert in &alerts {
        for facility_id in &alert.informed_facilities {
            let Some(facility) = facilities.get_mut(facility_id) else {
                unmatched += 1;
                continue;
            };
            let replace = match &facility.alert {
                Some(current) => alert.supersedes(current),
                None => true,
            };
            if let Some(current) = &facility.alert {
                debug!(
                    facility_id = %facility_id,
                    current = %current.id,
                    candidate = %alert.id,
                    replace,
                    "Facility named by several alerts"
                );
            }
            facility.status = FacilityStatus::OutOfService;
            if replace {
                facility.alert = Some(alert.clone());
            }
        }
    }

    let stations = aggregate_stations(&stops, &facilities);

    info!(
        facilities = facilities.len(),
        alerts = alerts.len(),
        unmatched_references = unmatched,
        out_of_service = facilities.values().filter(|f| f.is_out_of_service()).count(),
        stations = stations.len(),
        "Reconciled accessibility data"
    );

    AccessibilityView {
        facilities,
        stations,
    }
}

fn stop_lookup(facilities_doc: &Value) -> BTreeMap<String, StopInfo> {
    document::records::<StopAttributes>(facilities_doc, "included")
        .into_iter()
        .filter(|r| r.kind.as_deref() == Some("stop"))
        .map(|r| {
            let attrs = r.attributes;
            (
                r.id,
                StopInfo {
                    name: attrs.name,
                    latitude: attrs.latitude,
                    longitude: attrs.longitude,
                    wheelchair_boarding: WheelchairBoarding::from_code(attrs.wheelchair_boarding),
                },
            )
        })
        .collect()
}

fn facility_inventory(facilities_doc: &Value) -> BTreeMap<String, Facility> {
    let mut facilities = BTreeMap::new();
    for record in document::records::<FacilityAttributes>(facilities_doc, "data") {
        let Some(station_id) = record.relationships.stop.data.id else {
            warn!(facility_id = %record.id, "Facility has no stop reference, skipping");
            continue;
        };
        let attrs = record.attributes;
        facilities.insert(
            record.id.clone(),
            Facility {
                id: record.id,
                kind: FacilityKind::from_api(attrs.kind.as_deref()),
                name: attrs.long_name,
                short_name: attrs.short_name,
                station_id,
                status: FacilityStatus::Operational,
                alert: None,
            },
        );
    }
    facilities
}

/// Flattens an alert record into the uniform textual form.
pub fn normalize_alert(record: Record<AlertAttributes>) -> Alert {
    let attrs = record.attributes;

    let mut informed_facilities: Vec<String> = Vec::new();
    for entity in attrs.informed_entity {
        if let Some(facility) = entity.facility {
            if !informed_facilities.contains(&facility) {
                informed_facilities.push(facility);
            }
        }
    }

    let active_periods: Vec<ActivePeriod> = attrs
        .active_period
        .into_iter()
        .map(|p| ActivePeriod {
            start: p.start,
            end: p.end,
        })
        .collect();

    Alert {
        id: record.id,
        header: attrs.header,
        description: attrs.description,
        severity: attrs.severity,
        cause: attrs.cause,
        effect: attrs.effect,
        outage_start: active_periods.first().and_then(|p| p.start),
        updated_at: attrs.updated_at,
        active_periods,
        informed_facilities,
    }
}

fn aggregate_stations(
    stops: &BTreeMap<String, StopInfo>,
    facilities: &BTreeMap<String, Facility>,
) -> Vec<Station> {
    let mut counts: BTreeMap<&str, (usize, usize)> =
        stops.keys().map(|id| (id.as_str(), (0, 0))).collect();

    for facility in facilities.values() {
        let entry = counts.entry(facility.station_id.as_str()).or_default();
        match facility.status {
            FacilityStatus::Operational => entry.0 += 1,
            FacilityStatus::OutOfService => entry.1 += 1,
        }
    }

    counts
        .into_iter()
        .map(|(id, (n_operational, n_out_of_service))| match stops.get(id) {
            Some(stop) => Station {
                id: id.to_string(),
                name: stop.name.clone().unwrap_or_else(|| UNKNOWN_STATION.to_string()),
                latitude: stop.latitude,
                longitude: stop.longitude,
                wheelchair_boarding: stop.wheelchair_boarding,
                n_operational,
                n_out_of_service,
            },
            None => {
                warn!(station_id = id, "Facilities reference a stop missing from included");
                Station {
                    id: id.to_string(),
                    name: UNKNOWN_STATION.to_string(),
                    latitude: None,
                    longitude: None,
                    wheelchair_boarding: WheelchairBoarding::Unknown,
                    n_operational,
                    n_out_of_service,
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatusClass;
    use serde_json::json;

    fn facilities_doc() -> Value {
        json!({
            "data": [
                facility("F1", "ELEVATOR", "A"),
                facility("F2", "ELEVATOR", "B"),
                facility("F3", "ESCALATOR", "C"),
                facility("F4", "ELEVATOR", "C"),
            ],
            "included": [
                stop("A", "Alewife", 42.3954, -71.1425),
                stop("B", "Braintree", 42.2078, -71.0011),
                stop("C", "Chinatown", 42.3524, -71.0625),
            ]
        })
    }

    fn facility(id: &str, kind: &str, stop: &str) -> Value {
        json!({
            "id": id,
            "type": "facility",
            "attributes": {"type": kind, "short_name": format!("{kind} {id}"), "long_name": format!("{stop} {kind} {id}")},
            "relationships": {"stop": {"data": {"id": stop, "type": "stop"}}}
        })
    }

    fn stop(id: &str, name: &str, lat: f64, lon: f64) -> Value {
        json!({
            "id": id,
            "type": "stop",
            "attributes": {"name": name, "latitude": lat, "longitude": lon, "wheelchair_boarding": 1}
        })
    }

    fn alert(id: &str, facility: &str, header: &str, severity: Value, updated_at: &str) -> Value {
        json!({
            "id": id,
            "type": "alert",
            "attributes": {
                "header": header,
                "severity": severity,
                "cause": "MAINTENANCE",
                "effect": "ELEVATOR_CLOSURE",
                "updated_at": updated_at,
                "active_period": [{"start": "2024-02-28T05:00:00-05:00", "end": null}],
                "informed_entity": [{"facility": facility, "stop": "x", "activities": ["USING_WHEELCHAIR"]}]
            }
        })
    }

    fn alerts_doc() -> Value {
        json!({
            "data": [
                alert("a2", "F2", "Elevator shutdown for repairs", json!(3), "2024-03-01T08:00:00-05:00"),
                alert("a3", "F3", "Escalator closed", json!("3"), "2024-03-01T09:00:00-05:00"),
                alert("a9", "F404", "Unknown facility", json!(1), "2024-03-01T09:00:00-05:00"),
            ]
        })
    }

    #[test]
    fn test_counts_partition_facilities() {
        let view = reconcile(&facilities_doc(), &alerts_doc());
        for station in &view.stations {
            let referencing = view.facilities_at(&station.id).count();
            assert_eq!(station.total_facilities(), referencing, "station {}", station.id);
        }
    }

    #[test]
    fn test_facility_without_alert_stays_operational() {
        let view = reconcile(&facilities_doc(), &alerts_doc());
        let f1 = &view.facilities["F1"];
        assert_eq!(f1.status, FacilityStatus::Operational);
        assert!(f1.alert.is_none());
        let a = view.station("A").unwrap();
        assert_eq!(a.n_out_of_service, 0);
        assert_eq!(a.classification(), StatusClass::AllOk);
    }

    #[test]
    fn test_alerted_facility_is_out_of_service() {
        let view = reconcile(&facilities_doc(), &alerts_doc());
        let f2 = &view.facilities["F2"];
        assert_eq!(f2.status, FacilityStatus::OutOfService);
        assert_eq!(
            f2.alert.as_ref().unwrap().header.as_deref(),
            Some("Elevator shutdown for repairs")
        );
        let b = view.station("B").unwrap();
        assert_eq!(b.n_out_of_service, 1);
        assert_eq!(b.classification(), StatusClass::AllOut);
    }

    #[test]
    fn test_mixed_station_is_some_out() {
        let view = reconcile(&facilities_doc(), &alerts_doc());
        let c = view.station("C").unwrap();
        assert_eq!((c.n_operational, c.n_out_of_service), (1, 1));
        assert_eq!(c.classification(), StatusClass::SomeOut);
    }

    #[test]
    fn test_severity_integer_and_string_normalize_alike() {
        let view = reconcile(&facilities_doc(), &alerts_doc());
        let s2 = view.facilities["F2"].alert.as_ref().unwrap().severity.clone();
        let s3 = view.facilities["F3"].alert.as_ref().unwrap().severity.clone();
        assert_eq!(s2.as_deref(), Some("3"));
        assert_eq!(s2, s3);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let first = reconcile(&facilities_doc(), &alerts_doc());
        let second = reconcile(&facilities_doc(), &alerts_doc());
        assert_eq!(first, second);
    }

    #[test]
    fn test_most_recent_alert_wins_in_any_order() {
        let older = alert("z-old", "F1", "Old notice", json!(1), "2024-01-01T00:00:00-05:00");
        let newer = alert("a-new", "F1", "New notice", json!(2), "2024-03-01T00:00:00-05:00");

        for data in [json!([older.clone(), newer.clone()]), json!([newer, older])] {
            let view = reconcile(&facilities_doc(), &json!({ "data": data }));
            let attached = view.facilities["F1"].alert.as_ref().unwrap();
            assert_eq!(attached.id, "a-new");
        }
    }

    #[test]
    fn test_outage_start_comes_from_first_active_period() {
        let view = reconcile(&facilities_doc(), &alerts_doc());
        let alert = view.facilities["F2"].alert.as_ref().unwrap();
        assert_eq!(
            alert.outage_start.unwrap().to_rfc3339(),
            "2024-02-28T05:00:00-05:00"
        );
    }

    #[test]
    fn test_station_missing_from_included_gets_placeholder() {
        let doc = json!({
            "data": [facility("F9", "ELEVATOR", "ghost")],
            "included": []
        });
        let view = reconcile(&doc, &json!({"data": []}));
        let ghost = view.station("ghost").unwrap();
        assert_eq!(ghost.name, "Unknown");
        assert!(ghost.position().is_none());
        assert_eq!(ghost.n_operational, 1);
    }

    #[test]
    fn test_facility_without_stop_is_dropped() {
        let doc = json!({
            "data": [{"id": "F0", "attributes": {"type": "ELEVATOR"}}],
            "included": []
        });
        let view = reconcile(&doc, &json!({"data": []}));
        assert!(view.facilities.is_empty());
        assert!(view.stations.is_empty());
    }

    #[test]
    fn test_empty_documents() {
        let view = reconcile(&json!({}), &json!({}));
        assert!(view.facilities.is_empty());
        assert!(view.stations.is_empty());
    }

    #[test]
    fn test_summary_counts() {
        let view = reconcile(&facilities_doc(), &alerts_doc());
        let summary = view.summary();
        assert_eq!(summary.total_stations, 3);
        assert_eq!(summary.stations_with_outages, 2);
        assert_eq!(summary.total_facilities, 4);
        assert_eq!(summary.total_out_of_service, 2);
    }

    #[test]
    fn test_outages_grouped_by_station_name() {
        let view = reconcile(&facilities_doc(), &alerts_doc());
        let grouped = view.outages_by_station();
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec!["Braintree", "Chinatown"]);
        assert_eq!(grouped["Chinatown"][0].id, "F3");
    }
}

//! Reconciled accessibility view: facilities, their alerts, and stations.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityKind {
    Elevator,
    Escalator,
    Ramp,
    PortableBoardingLift,
    /// Anything the agency adds later that we do not know about yet.
    Other,
}

impl FacilityKind {
    pub fn from_api(value: Option<&str>) -> Self {
        match value {
            Some("ELEVATOR") => FacilityKind::Elevator,
            Some("ESCALATOR") => FacilityKind::Escalator,
            Some("RAMP") => FacilityKind::Ramp,
            Some("PORTABLE_BOARDING_LIFT") => FacilityKind::PortableBoardingLift,
            _ => FacilityKind::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FacilityKind::Elevator => "ELEVATOR",
            FacilityKind::Escalator => "ESCALATOR",
            FacilityKind::Ramp => "RAMP",
            FacilityKind::PortableBoardingLift => "PORTABLE_BOARDING_LIFT",
            FacilityKind::Other => "OTHER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacilityStatus {
    Operational,
    OutOfService,
}

/// GTFS `wheelchair_boarding` as reported on MBTA stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelchairBoarding {
    #[default]
    Unknown,
    Accessible,
    Inaccessible,
}

impl WheelchairBoarding {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => WheelchairBoarding::Accessible,
            Some(2) => WheelchairBoarding::Inaccessible,
            _ => WheelchairBoarding::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivePeriod {
    pub start: Option<DateTime<FixedOffset>>,
    pub end: Option<DateTime<FixedOffset>>,
}

/// An alert after normalization. Every free-form field is text, whatever
/// JSON type the API happened to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub id: String,
    pub header: Option<String>,
    pub description: Option<String>,
    pub severity: Option<String>,
    pub cause: Option<String>,
    pub effect: Option<String>,
    pub outage_start: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
    pub active_periods: Vec<ActivePeriod>,
    pub informed_facilities: Vec<String>,
}

impl Alert {
    /// Ordering used when several alerts name the same facility: the most
    /// recently updated alert wins, then the greater id.
    pub fn supersedes(&self, other: &Alert) -> bool {
        (self.updated_at, &self.id) > (other.updated_at, &other.id)
    }
}

/// A route-level disruption (shuttle, suspension, ...) affecting a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceAlert {
    pub id: String,
    pub header: String,
    pub effect: String,
    pub description: Option<String>,
    pub active_periods: Vec<ActivePeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facility {
    pub id: String,
    pub kind: FacilityKind,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub station_id: String,
    pub status: FacilityStatus,
    pub alert: Option<Alert>,
}

impl Facility {
    pub fn is_out_of_service(&self) -> bool {
        self.status == FacilityStatus::OutOfService
    }

    /// Best available display name.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.short_name.as_deref())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusClass {
    AllOk,
    SomeOut,
    AllOut,
}

impl StatusClass {
    pub fn classify(n_operational: usize, n_out_of_service: usize) -> Self {
        if n_out_of_service == 0 {
            StatusClass::AllOk
        } else if n_operational == 0 {
            StatusClass::AllOut
        } else {
            StatusClass::SomeOut
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::AllOk => "ALL_OK",
            StatusClass::SomeOut => "SOME_OUT",
            StatusClass::AllOut => "ALL_OUT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub wheelchair_boarding: WheelchairBoarding,
    pub n_operational: usize,
    pub n_out_of_service: usize,
}

impl Station {
    pub fn classification(&self) -> StatusClass {
        StatusClass::classify(self.n_operational, self.n_out_of_service)
    }

    pub fn total_facilities(&self) -> usize {
        self.n_operational + self.n_out_of_service
    }

    /// Coordinates, when the station can be placed on the map.
    pub fn position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// System-wide counts shown at the top of the dashboard and in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SystemSummary {
    pub total_stations: usize,
    pub stations_with_outages: usize,
    pub total_facilities: usize,
    pub total_out_of_service: usize,
}

/// One fetch cycle's worth of reconciled data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessibilityView {
    pub facilities: BTreeMap<String, Facility>,
    /// Sorted by station id.
    pub stations: Vec<Station>,
}

impl AccessibilityView {
    pub fn station(&self, id: &str) -> Option<&Station> {
        self.stations
            .binary_search_by(|s| s.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.stations[idx])
    }

    /// Looks a station up by exact id, then by case-insensitive name, then
    /// by a name fragment that matches exactly one station.
    pub fn find_station(&self, query: &str) -> Option<&Station> {
        let query = query.trim();
        if let Some(station) = self.station(query) {
            return Some(station);
        }
        let lowered = query.to_lowercase();
        if let Some(station) = self
            .stations
            .iter()
            .find(|s| s.name.to_lowercase() == lowered)
        {
            return Some(station);
        }
        let mut partial = self
            .stations
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&lowered));
        match (partial.next(), partial.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub fn facilities_at<'a>(&'a self, station_id: &'a str) -> impl Iterator<Item = &'a Facility> {
        self.facilities
            .values()
            .filter(move |f| f.station_id == station_id)
    }

    pub fn summary(&self) -> SystemSummary {
        SystemSummary {
            total_stations: self.stations.len(),
            stations_with_outages: self
                .stations
                .iter()
                .filter(|s| s.n_out_of_service > 0)
                .count(),
            total_facilities: self.facilities.len(),
            total_out_of_service: self
                .facilities
                .values()
                .filter(|f| f.is_out_of_service())
                .count(),
        }
    }

    /// Out-of-service facilities grouped by station name.
    pub fn outages_by_station(&self) -> BTreeMap<&str, Vec<&Facility>> {
        let mut grouped: BTreeMap<&str, Vec<&Facility>> = BTreeMap::new();
        for facility in self.facilities.values().filter(|f| f.is_out_of_service()) {
            let name = self
                .station(&facility.station_id)
                .map(|s| s.name.as_str())
                .unwrap_or("Unknown");
            grouped.entry(name).or_default().push(facility);
        }
        grouped
    }
}

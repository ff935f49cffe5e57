//! Wire types for the JSON:API documents returned by the MBTA v3 API.
//!
//! Only the fields the tracker reads are modelled. Records that cannot be
//! read at all (no id, not an object) are skipped with a warning rather than
//! failing the whole document.

use super::normalize;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "A: DeserializeOwned + Default"))]
pub struct Resource<A> {
    #[serde(default, deserialize_with = "normalize::text")]
    pub id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "normalize::text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "normalize::or_default")]
    pub attributes: A,
    #[serde(default, deserialize_with = "normalize::or_default")]
    pub relationships: Relationships,
}

#[derive(Debug, Default, Deserialize)]
pub struct Relationships {
    #[serde(default, deserialize_with = "normalize::or_default")]
    pub stop: Relationship,
}

#[derive(Debug, Default, Deserialize)]
pub struct Relationship {
    #[serde(default, deserialize_with = "normalize::or_default")]
    pub data: ResourceRef,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceRef {
    #[serde(default, deserialize_with = "normalize::text")]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopAttributes {
    #[serde(default, deserialize_with = "normalize::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "normalize::float")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "normalize::float")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "normalize::integer")]
    pub wheelchair_boarding: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FacilityAttributes {
    #[serde(rename = "type", default, deserialize_with = "normalize::text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "normalize::text")]
    pub long_name: Option<String>,
    #[serde(default, deserialize_with = "normalize::text")]
    pub short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertAttributes {
    #[serde(default, deserialize_with = "normalize::text")]
    pub header: Option<String>,
    #[serde(default, deserialize_with = "normalize::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "normalize::text")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "normalize::text")]
    pub cause: Option<String>,
    #[serde(default, deserialize_with = "normalize::text")]
    pub effect: Option<String>,
    #[serde(default, deserialize_with = "normalize::timestamp")]
    pub updated_at: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "normalize::list")]
    pub active_period: Vec<ActivePeriodRecord>,
    #[serde(default, deserialize_with = "normalize::list")]
    pub informed_entity: Vec<InformedEntity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActivePeriodRecord {
    #[serde(default, deserialize_with = "normalize::timestamp")]
    pub start: Option<DateTime<FixedOffset>>,
    #[serde(default, deserialize_with = "normalize::timestamp")]
    pub end: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InformedEntity {
    #[serde(default, deserialize_with = "normalize::text")]
    pub facility: Option<String>,
    #[serde(default, deserialize_with = "normalize::text")]
    pub stop: Option<String>,
    #[serde(default, deserialize_with = "normalize::text")]
    pub route: Option<String>,
}

/// A resource with a usable id.
pub struct Record<A> {
    pub id: String,
    pub kind: Option<String>,
    pub attributes: A,
    pub relationships: Relationships,
}

/// Reads the array at `doc[key]` (`"data"` or `"included"`) as records.
///
/// A missing or non-array member yields no records.
pub fn records<A>(doc: &Value, key: &str) -> Vec<Record<A>>
where
    A: DeserializeOwned + Default,
{
    let Some(items) = doc.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match Resource::<A>::deserialize(item) {
            Ok(Resource {
                id: Some(id),
                kind,
                attributes,
                relationships,
            }) => Some(Record {
                id,
                kind,
                attributes,
                relationships,
            }),
            Ok(_) => {
                warn!(key, index, "Record without id, skipping");
                None
            }
            Err(e) => {
                warn!(key, index, error = %e, "Malformed record, skipping");
                None
            }
        })
        .collect()
}

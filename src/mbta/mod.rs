//! Client for the MBTA v3 API and its JSON:API document types.

mod client;
pub mod document;
pub mod normalize;

pub use client::{MbtaClient, SERVICE_EFFECTS};

use serde_json::Value;

/// Raw bodies of the two requests one dashboard refresh needs.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub facilities: Value,
    pub alerts: Value,
}

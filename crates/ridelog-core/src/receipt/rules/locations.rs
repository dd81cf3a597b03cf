//! Pickup and dropoff address extraction.

use serde::Serialize;
use tracing::debug;

use super::patterns::{DROPOFF_SECTION, PICKUP_SECTION};
use super::FieldExtractor;
use crate::models::ride::{Field, RawReceipt};

/// Address the routing service resolves to the wrong airport.
const MISROUTED_AIRPORT_ROAD: &str = "Airport Access Rd, CA";

/// Replacement for [`MISROUTED_AIRPORT_ROAD`].
pub const SFO_CANONICAL: &str = "San Francisco International Airport";

/// Fragments that keep an otherwise usable address from geocoding.
const UNGEOCODABLE_FRAGMENTS: [&str; 2] = ["Unnamed Road,", "International Terminal Departures"];

/// Start and end of a ride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RideLocations {
    pub start: Field<String>,
    pub end: Field<String>,
}

/// Location field extractor.
pub struct LocationExtractor;

impl LocationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for LocationExtractor {
    type Output = RideLocations;

    fn extract(&self, receipt: &RawReceipt) -> Self::Output {
        RideLocations {
            start: extract_start_location(receipt.text()),
            end: extract_end_location(receipt.text()),
        }
    }
}

/// Address between the pickup and dropoff markers.
pub fn extract_start_location(text: &str) -> Field<String> {
    let raw = PICKUP_SECTION.captures(text).map(|caps| caps[1].to_string());
    finish_address("pickup", raw)
}

/// Address between the dropoff marker and the first terminal phrase.
pub fn extract_end_location(text: &str) -> Field<String> {
    let raw = DROPOFF_SECTION.captures(text).map(|caps| caps[1].to_string());
    finish_address("dropoff", raw)
}

fn finish_address(label: &str, raw: Option<String>) -> Field<String> {
    let address = raw
        .map(|s| correct_special_address(&s))
        .filter(|s| !s.is_empty());

    if address.is_none() {
        debug!("No {} address found", label);
    }

    address.into()
}

/// Rewrite addresses the routing service is known to mishandle.
pub fn correct_special_address(address: &str) -> String {
    if address.contains(MISROUTED_AIRPORT_ROAD) {
        return SFO_CANONICAL.to_string();
    }

    let mut cleaned = address.to_string();
    for fragment in UNGEOCODABLE_FRAGMENTS {
        cleaned = cleaned.replace(fragment, "");
    }

    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

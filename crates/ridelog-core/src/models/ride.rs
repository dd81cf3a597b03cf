//! Ride data models: raw receipts, parse results and enriched rides.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::receipt::rules::normalize::normalize;

/// A single extracted field, or an explicit marker that it could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field<T> {
    /// The field was recovered from the receipt text.
    Parsed(T),
    /// No pattern matched for this field.
    Unparseable,
}

impl<T> Field<T> {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Field::Parsed(_))
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Parsed(v) => Field::Parsed(v),
            Field::Unparseable => Field::Unparseable,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Parsed(v) => Field::Parsed(f(v)),
            Field::Unparseable => Field::Unparseable,
        }
    }

    pub fn parsed(self) -> Option<T> {
        match self {
            Field::Parsed(v) => Some(v),
            Field::Unparseable => None,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Parsed(v),
            None => Field::Unparseable,
        }
    }
}

/// One ride-completion email body, normalized for pattern matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReceipt {
    text: String,
    fallback_year: i32,
    source: Option<String>,
}

impl RawReceipt {
    /// Build a receipt from an email body. The body is normalized here, once.
    pub fn new(body: &str, fallback_year: i32) -> Self {
        Self {
            text: normalize(body),
            fallback_year,
            source: None,
        }
    }

    /// Attach a label (file name, message id) used in log output.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Normalized, single-line receipt text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Year from the message metadata, used when the text omits one.
    pub fn fallback_year(&self) -> i32 {
        self.fallback_year
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Structured fields recovered from one receipt.
///
/// Every field is extracted independently, so any combination of parsed and
/// unparseable fields is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRide {
    start_location: Field<String>,
    end_location: Field<String>,
    timestamp: Field<NaiveDateTime>,
    price: Option<u32>,
    bonus_credit: u32,
}

impl ParsedRide {
    pub fn new(
        start_location: Field<String>,
        end_location: Field<String>,
        timestamp: Field<NaiveDateTime>,
        price: Option<u32>,
        bonus_credit: u32,
    ) -> Self {
        Self {
            start_location,
            end_location,
            timestamp,
            price,
            bonus_credit,
        }
    }

    pub fn start_location(&self) -> &Field<String> {
        &self.start_location
    }

    pub fn end_location(&self) -> &Field<String> {
        &self.end_location
    }

    pub fn timestamp(&self) -> &Field<NaiveDateTime> {
        &self.timestamp
    }

    /// Ride price in whole currency units, if a pricing clause was found.
    pub fn price(&self) -> Option<u32> {
        self.price
    }

    /// Credit applied to the ride in whole currency units.
    pub fn bonus_credit(&self) -> u32 {
        self.bonus_credit
    }

    /// Names of the fields that could not be parsed.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.start_location.is_parsed() {
            missing.push("start_location");
        }
        if !self.end_location.is_parsed() {
            missing.push("end_location");
        }
        if !self.timestamp.is_parsed() {
            missing.push("timestamp");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        missing
    }
}

/// A (longitude, latitude) pair as returned by the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// The pair in `[latitude, longitude]` order, as map front-ends expect.
    pub fn lat_lng(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// Outcome of the enrichment step for one ride.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum EnrichmentStatus {
    /// Not attempted (routing disabled).
    NotAttempted,
    /// The routing service answered.
    Routed,
    /// A location was unparseable; distance defaults to zero.
    SkippedUnparseable,
    /// Every attempt failed; distance and coordinates stay absent.
    Failed(String),
}

/// A parsed ride plus the data obtained from the routing service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRide {
    /// The original parse result, untouched.
    pub ride: ParsedRide,

    /// Road-network distance in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<u64>,

    /// Canonical start address from the routing service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_address: Option<String>,

    /// Canonical end address from the routing service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_coordinates: Option<Coordinates>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_coordinates: Option<Coordinates>,

    pub enrichment: EnrichmentStatus,
}

impl EnrichedRide {
    /// Wrap a ride that has not been routed.
    pub fn unrouted(ride: ParsedRide) -> Self {
        Self {
            ride,
            distance_m: None,
            start_address: None,
            end_address: None,
            start_coordinates: None,
            end_coordinates: None,
            enrichment: EnrichmentStatus::NotAttempted,
        }
    }

    /// Start address to display: the canonical one if known.
    pub fn display_start(&self) -> Option<&str> {
        self.start_address
            .as_deref()
            .or_else(|| self.ride.start_location().as_ref().parsed().map(String::as_str))
    }

    /// End address to display: the canonical one if known.
    pub fn display_end(&self) -> Option<&str> {
        self.end_address
            .as_deref()
            .or_else(|| self.ride.end_location().as_ref().parsed().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_ride() -> ParsedRide {
        ParsedRide::new(
            Field::Parsed("1 Market St, San Francisco, CA".to_string()),
            Field::Unparseable,
            Field::Parsed(
                NaiveDate::from_ymd_opt(2012, 11, 25)
                    .unwrap()
                    .and_hms_opt(10, 7, 0)
                    .unwrap(),
            ),
            None,
            0,
        )
    }

    #[test]
    fn test_raw_receipt_normalizes_body() {
        let receipt = RawReceipt::new("Ride  completed=\r\n on\n*Nov*", 2012);
        assert_eq!(receipt.text(), "Ride completed on Nov");
        assert_eq!(receipt.fallback_year(), 2012);
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(sample_ride().missing_fields(), vec!["end_location", "price"]);
    }

    #[test]
    fn test_field_serializes_as_value_or_null() {
        let json = serde_json::to_value(sample_ride()).unwrap();
        assert_eq!(json["start_location"], "1 Market St, San Francisco, CA");
        assert!(json["end_location"].is_null());
        assert_eq!(json["timestamp"], "2012-11-25T10:07:00");
    }

    #[test]
    fn test_display_prefers_canonical_address() {
        let mut enriched = EnrichedRide::unrouted(sample_ride());
        assert_eq!(enriched.display_start(), Some("1 Market St, San Francisco, CA"));
        assert_eq!(enriched.display_end(), None);

        enriched.start_address = Some("1 Market St, San Francisco, CA 94105, USA".to_string());
        assert_eq!(
            enriched.display_start(),
            Some("1 Market St, San Francisco, CA 94105, USA")
        );
    }

    #[test]
    fn test_coordinates_lat_lng_order() {
        let c = Coordinates::new(-122.39, 37.79);
        assert_eq!(c.lat_lng(), [37.79, -122.39]);
    }
}

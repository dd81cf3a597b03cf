//! Receipt parser combining the per-field rules.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::models::ride::{ParsedRide, RawReceipt};

use super::rules::{
    AmountExtractor, FieldExtractor, LocationExtractor, PriceCase, TimestampExtractor,
    TimestampOverrides,
};
use super::RideParser;

/// Result of parsing one receipt.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Extracted ride.
    pub ride: ParsedRide,
    /// Which price phrasing matched, if any.
    pub price_case: Option<PriceCase>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in microseconds.
    pub processing_time_us: u64,
}

/// Rule-based receipt parser.
pub struct ReceiptParser {
    locations: LocationExtractor,
    amounts: AmountExtractor,
    timestamps: TimestampExtractor,
}

impl ReceiptParser {
    /// Create a parser with the built-in timestamp overrides.
    pub fn new() -> Self {
        Self::with_overrides(TimestampOverrides::builtin())
    }

    /// Create a parser with a custom timestamp override table.
    pub fn with_overrides(overrides: TimestampOverrides) -> Self {
        Self {
            locations: LocationExtractor::new(),
            amounts: AmountExtractor::new(),
            timestamps: TimestampExtractor::new(overrides),
        }
    }

    /// Create a parser whose overrides come from `path`, or the built-in
    /// table when no path is given.
    pub fn from_overrides_file(path: Option<&Path>) -> crate::Result<Self> {
        let overrides = match path {
            Some(p) => TimestampOverrides::from_file(p)?,
            None => TimestampOverrides::builtin(),
        };
        Ok(Self::with_overrides(overrides))
    }

    /// Parse and report which fields were missing.
    pub fn parse_detailed(&self, receipt: &RawReceipt) -> ExtractionResult {
        let start = Instant::now();
        let source = receipt.source().unwrap_or("<receipt>");

        debug!("Parsing {} ({} characters)", source, receipt.text().len());

        // Each field reads the same text independently.
        let locations = self.locations.extract(receipt);
        let amounts = self.amounts.extract(receipt);
        let timestamp = self.timestamps.extract(receipt);

        let ride = ParsedRide::new(
            locations.start,
            locations.end,
            timestamp,
            amounts.price.map(|p| p.amount),
            amounts.bonus,
        );

        let warnings: Vec<String> = ride
            .missing_fields()
            .into_iter()
            .map(|field| format!("Could not extract {}", field))
            .collect();

        if !warnings.is_empty() {
            info!("{}: {}", source, warnings.join(", "));
        }

        ExtractionResult {
            ride,
            price_case: amounts.price.map(|p| p.case),
            warnings,
            processing_time_us: start.elapsed().as_micros() as u64,
        }
    }

    pub fn overrides(&self) -> &TimestampOverrides {
        self.timestamps.overrides()
    }
}

impl Default for ReceiptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RideParser for ReceiptParser {
    fn parse(&self, receipt: &RawReceipt) -> ParsedRide {
        self.parse_detailed(receipt).ride
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ride::Field;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    const FULL_RECEIPT: &str = "Lyft Receipt #2000000001\r\n\
        Ride completed on September 22, 2012 at 7:02 PM Your Driver was Alex\r\n\
        *Pickup* 6:41 PM: 1 Market St, San Francisco, CA\r\n\
        *Dropoff* 7:02 PM: Unnamed Road, Treasure Island, San Francisco, CA 94130, USA\r\n\
        Lyft ride charges: $15.=\r\n75 Lyft Credits applied: - $5.00 Card ending with 4242";

    #[test]
    fn test_parse_full_receipt() {
        let receipt = RawReceipt::new(FULL_RECEIPT, 2012);
        let result = ReceiptParser::new().parse_detailed(&receipt);
        let ride = result.ride;

        assert_eq!(
            ride.start_location(),
            &Field::Parsed("1 Market St, San Francisco, CA".to_string())
        );
        assert_eq!(
            ride.end_location(),
            &Field::Parsed("Treasure Island, San Francisco, CA 94130".to_string())
        );
        assert_eq!(
            ride.timestamp(),
            &Field::Parsed(
                NaiveDate::from_ymd_opt(2012, 9, 22)
                    .unwrap()
                    .and_hms_opt(19, 2, 0)
                    .unwrap()
            )
        );
        assert_eq!(ride.price(), Some(15));
        assert_eq!(ride.bonus_credit(), 5);
        assert_eq!(result.price_case, Some(PriceCase::RideCharges));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_partial_success() {
        let receipt = RawReceipt::new("Donation: $9.40 Total Thanks for riding!", 2013);
        let result = ReceiptParser::new().parse_detailed(&receipt);

        assert_eq!(result.ride.start_location(), &Field::Unparseable);
        assert_eq!(result.ride.end_location(), &Field::Unparseable);
        assert_eq!(result.ride.timestamp(), &Field::Unparseable);
        assert_eq!(result.ride.price(), Some(9));
        assert_eq!(result.ride.bonus_credit(), 0);
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_override_receipt() {
        let receipt = RawReceipt::new(
            "Receipt #1013515411 Ride completed on December 13, 2012 Your Driver Lyft ride charges: $20.00 Card ending with 1",
            2012,
        );
        let ride = ReceiptParser::new().parse(&receipt);

        assert_eq!(
            ride.timestamp(),
            &Field::Parsed(
                NaiveDate::from_ymd_opt(2012, 12, 13)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(ride.price(), Some(20));
    }

    #[test]
    fn test_overrides_come_from_file_when_configured() {
        assert_eq!(ReceiptParser::new().overrides().len(), 4);
        assert_eq!(ReceiptParser::from_overrides_file(None).unwrap().overrides().len(), 4);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, r#"{"77": "2013-02-03T04:05:00"}"#).unwrap();

        let parser = ReceiptParser::from_overrides_file(Some(&path)).unwrap();
        assert_eq!(parser.overrides().len(), 1);

        let ride = parser.parse(&RawReceipt::new("Receipt #77", 2013));
        assert_eq!(
            ride.timestamp(),
            &Field::Parsed(
                NaiveDate::from_ymd_opt(2013, 2, 3)
                    .unwrap()
                    .and_hms_opt(4, 5, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_empty_receipt() {
        let ride = ReceiptParser::new().parse(&RawReceipt::new("", 2012));
        assert_eq!(
            ride.missing_fields(),
            vec!["start_location", "end_location", "timestamp", "price"]
        );
        assert_eq!(ride.bonus_credit(), 0);
    }
}

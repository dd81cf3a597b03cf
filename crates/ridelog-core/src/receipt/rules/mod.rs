//! Rule-based field extractors for ride receipts.

pub mod amounts;
pub mod dates;
pub mod locations;
pub mod normalize;
pub mod overrides;
pub mod patterns;

pub use amounts::{extract_bonus, extract_price, whole_units, AmountExtractor, PriceCase, PriceMatch, RideAmounts};
pub use dates::{extract_completion_time, parse_completion_date, TimestampExtractor};
pub use locations::{correct_special_address, extract_end_location, extract_start_location, LocationExtractor, RideLocations};
pub use normalize::normalize;
pub use overrides::TimestampOverrides;
pub use patterns::fuzzy_keyword;

use crate::models::ride::RawReceipt;

/// Trait for field extractors.
///
/// Extraction never fails: an extractor reports a missing field through its
/// output type (`Field::Unparseable`, `None` or a default).
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from a normalized receipt.
    fn extract(&self, receipt: &RawReceipt) -> Self::Output;
}

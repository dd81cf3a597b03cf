//! Ride receipt field extraction module.

mod parser;
pub mod rules;

pub use parser::{ExtractionResult, ReceiptParser};

use crate::models::ride::{ParsedRide, RawReceipt};

/// Trait for receipt parsing.
///
/// Parsing is infallible by contract: fields that cannot be recovered are
/// reported as sentinels inside the returned ride.
pub trait RideParser {
    /// Parse one receipt into a ride.
    fn parse(&self, receipt: &RawReceipt) -> ParsedRide;

    /// Parse a batch of receipts, one ride per receipt, in order.
    fn parse_all(&self, receipts: &[RawReceipt]) -> Vec<ParsedRide> {
        receipts.iter().map(|r| self.parse(r)).collect()
    }
}

//! Price and bonus credit extraction.

use std::str::FromStr;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::patterns::{BONUS_CREDIT, PRICE_DONATION, PRICE_NAMED_DONATION, PRICE_RIDE_CHARGES};
use super::FieldExtractor;
use crate::models::ride::RawReceipt;

/// The phrasing a price was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceCase {
    /// "Donation given to <driver>: $x", optionally with credits applied.
    NamedDonation,
    /// "Lyft ride charges: $x".
    RideCharges,
    /// "Donation: $x Total".
    Donation,
}

/// A matched price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceMatch {
    pub case: PriceCase,
    /// Whole currency units, truncated.
    pub amount: u32,
}

/// Price and credit of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RideAmounts {
    pub price: Option<PriceMatch>,
    pub bonus: u32,
}

/// Price and bonus field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = RideAmounts;

    fn extract(&self, receipt: &RawReceipt) -> Self::Output {
        RideAmounts {
            price: extract_price(receipt.text()),
            bonus: extract_bonus(receipt.text()),
        }
    }
}

/// Find the ride price. Phrasings are tried in a fixed order and the first
/// match wins.
pub fn extract_price(text: &str) -> Option<PriceMatch> {
    let cases: [(PriceCase, &Regex, usize); 3] = [
        (PriceCase::NamedDonation, &*PRICE_NAMED_DONATION, 2),
        (PriceCase::RideCharges, &*PRICE_RIDE_CHARGES, 1),
        (PriceCase::Donation, &*PRICE_DONATION, 1),
    ];

    cases.into_iter().find_map(|(case, pattern, group)| {
        let caps = pattern.captures(text)?;
        let amount = whole_units(&caps[group])?;
        Some(PriceMatch { case, amount })
    })
}

/// Credit applied to the ride, or 0 when none is mentioned.
pub fn extract_bonus(text: &str) -> u32 {
    BONUS_CREDIT
        .captures(text)
        .and_then(|caps| whole_units(&caps[1]))
        .unwrap_or(0)
}

/// Parse a dollar amount and drop the cents (`12.99` -> `12`).
pub fn whole_units(amount: &str) -> Option<u32> {
    Decimal::from_str(amount.trim()).ok()?.trunc().to_u32()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ride_charges() {
        let price = extract_price("Lyft ride charges: $12.50 Card ending with 1234").unwrap();
        assert_eq!(price.case, PriceCase::RideCharges);
        assert_eq!(price.amount, 12);
    }

    #[test]
    fn test_named_donation_with_credit() {
        let text = "Donation given to Tory: $5.00 Lyft Credits applied: - $2.00 Card ending with 1234";

        let price = extract_price(text).unwrap();
        assert_eq!(price.case, PriceCase::NamedDonation);
        assert_eq!(price.amount, 5);
        assert_eq!(extract_bonus(text), 2);
    }

    #[test]
    fn test_named_donation_without_given() {
        let price = extract_price("Donation to J. R. Smith: $17.99 Card ending with 0001").unwrap();
        assert_eq!(price.case, PriceCase::NamedDonation);
        assert_eq!(price.amount, 17);
    }

    #[test]
    fn test_unnamed_donation() {
        let price = extract_price("Donation: $22.75 Total charged").unwrap();
        assert_eq!(price.case, PriceCase::Donation);
        assert_eq!(price.amount, 22);
    }

    #[test]
    fn test_priority_order() {
        let text = "Lyft ride charges: $30.00 Lyft Credits applied: - $5.00 Card ending with 9 \
            Donation given to Ana: $9.00 Card ending with 9";
        assert_eq!(extract_price(text).unwrap().case, PriceCase::NamedDonation);

        let text = "Donation: $4.00 Total Lyft ride charges: $30.00 Card ending with 9";
        assert_eq!(extract_price(text).unwrap().case, PriceCase::RideCharges);
    }

    #[test]
    fn test_no_price() {
        assert_eq!(extract_price("Thanks for riding"), None);
        assert_eq!(extract_price(""), None);
    }

    #[test]
    fn test_bonus_defaults_to_zero() {
        assert_eq!(extract_bonus("Lyft ride charges: $12.50 Card ending with 1234"), 0);
    }

    #[test]
    fn test_bonus_independent_of_price_case() {
        let text = "Lyft ride charges: $18.00 Lyft Credits applied: - $10.99 Card ending with 1234";
        assert_eq!(extract_price(text).unwrap().amount, 18);
        assert_eq!(extract_bonus(text), 10);
    }

    #[test]
    fn test_whole_units_truncates() {
        assert_eq!(whole_units("12.99"), Some(12));
        assert_eq!(whole_units("0.50"), Some(0));
        assert_eq!(whole_units("7"), Some(7));
        assert_eq!(whole_units("abc"), None);
    }
}

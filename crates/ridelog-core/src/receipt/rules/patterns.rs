//! Common regex patterns for ride receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Build a pattern for `word` that tolerates one stray whitespace character
/// after each letter, e.g. `P i ckup` or `Drop off`.
pub fn fuzzy_keyword(word: &str) -> String {
    word.chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join(r"\s?")
}

/// Section label up to its first colon. Colons inside clock times (`10:07`)
/// are part of the label, not its end.
const LABEL: &str = r"(?:\d:\d|[^:])*?:";

lazy_static! {
    // Locations
    pub static ref PICKUP_SECTION: Regex = Regex::new(&format!(
        r"{}{}\s*(.*?)\s*{}",
        fuzzy_keyword("Pickup"),
        LABEL,
        fuzzy_keyword("Dropoff"),
    )).unwrap();

    pub static ref DROPOFF_SECTION: Regex = Regex::new(&format!(
        r"{}{}\s*(.*?)[\s,]*(?:USA|Lyft ride|Donation given|Donation:)",
        fuzzy_keyword("Dropoff"),
        LABEL,
    )).unwrap();

    // Prices, in priority order
    pub static ref PRICE_NAMED_DONATION: Regex = Regex::new(
        r"Donation(?: given)? to ([.\s\w]+): \$(\d+\.\d+)(?: Lyft Credits applied:\s-\s\$\d+\.\d+)? Card ending with"
    ).unwrap();

    pub static ref PRICE_RIDE_CHARGES: Regex = Regex::new(
        r"Lyft ride charges: \$(\d+(?:\.\d+)?)\s*(?:Card ending with|Lyft Credits)"
    ).unwrap();

    pub static ref PRICE_DONATION: Regex = Regex::new(
        r"Donation: \$(\d+(?:\.\d+)?) Total"
    ).unwrap();

    // Credit applied on top of the price
    pub static ref BONUS_CREDIT: Regex = Regex::new(
        r"Lyft Credits applied:\s*-\s*\$(\d+(?:\.\d+)?)\s*Card"
    ).unwrap();

    // Completion timestamp
    pub static ref RIDE_COMPLETED: Regex = Regex::new(
        r"Ride completed on (.*?) Your Driver"
    ).unwrap();

    pub static ref AT_WORD: Regex = Regex::new(r"\bat\b").unwrap();

    pub static ref FOUR_DIGIT_YEAR: Regex = Regex::new(r"\b\d{4}\b").unwrap();

    // Receipt identifier
    pub static ref RECEIPT_ID: Regex = Regex::new(r"Receipt #(\d+)").unwrap();
}

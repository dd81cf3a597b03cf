//! Ride completion timestamp extraction.

use chrono::NaiveDateTime;
use tracing::debug;

use super::overrides::TimestampOverrides;
use super::patterns::{AT_WORD, FOUR_DIGIT_YEAR, RIDE_COMPLETED};
use super::FieldExtractor;
use crate::models::ride::{Field, RawReceipt};

/// "2012 November 25 10:07 AM", the shape after a fallback year is prepended.
const YEAR_FIRST: &str = "%Y %B %d %I:%M %p";

/// "September 22, 2012 7:02 PM".
const MONTH_FIRST: &str = "%B %d, %Y %I:%M %p";

/// Timestamp field extractor.
pub struct TimestampExtractor {
    overrides: TimestampOverrides,
}

impl TimestampExtractor {
    pub fn new(overrides: TimestampOverrides) -> Self {
        Self { overrides }
    }

    pub fn overrides(&self) -> &TimestampOverrides {
        &self.overrides
    }
}

impl Default for TimestampExtractor {
    fn default() -> Self {
        Self::new(TimestampOverrides::builtin())
    }
}

impl FieldExtractor for TimestampExtractor {
    type Output = Field<NaiveDateTime>;

    fn extract(&self, receipt: &RawReceipt) -> Self::Output {
        if let Some((id, timestamp)) = self.overrides.lookup(receipt.text()) {
            debug!("Using override timestamp {} for receipt #{}", timestamp, id);
            return Field::Parsed(timestamp);
        }

        extract_completion_time(receipt.text(), receipt.fallback_year())
    }
}

/// Parse the "Ride completed on ... Your Driver" clause.
pub fn extract_completion_time(text: &str, fallback_year: i32) -> Field<NaiveDateTime> {
    let Some(caps) = RIDE_COMPLETED.captures(text) else {
        debug!("No completion clause found");
        return Field::Unparseable;
    };

    let date_text = prepare_date_text(&caps[1], fallback_year);
    let parsed = parse_completion_date(&date_text);
    if parsed.is_none() {
        debug!("Unparseable completion date: {:?}", date_text);
    }

    parsed.into()
}

/// Drop the word "at", collapse spaces and prepend the fallback year when
/// the text has no year of its own.
pub fn prepare_date_text(raw: &str, fallback_year: i32) -> String {
    let without_at = AT_WORD.replace_all(raw, " ");
    let collapsed = without_at.split_whitespace().collect::<Vec<_>>().join(" ");

    if FOUR_DIGIT_YEAR.is_match(&collapsed) {
        collapsed
    } else {
        format!("{} {}", fallback_year, collapsed)
    }
}

/// Try both date layouts. The leading-year layout wins when both parse.
pub fn parse_completion_date(date_text: &str) -> Option<NaiveDateTime> {
    let year_first = NaiveDateTime::parse_from_str(date_text, YEAR_FIRST).ok();
    let month_first = NaiveDateTime::parse_from_str(date_text, MONTH_FIRST).ok();

    year_first.or(month_first)
}

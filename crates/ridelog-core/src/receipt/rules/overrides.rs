//! Per-receipt timestamp overrides.
//!
//! A few historical receipts carry no completion time at all. They are
//! listed here by receipt number, each with a fixed date-time, and take
//! precedence over whatever the date patterns would find.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::patterns::RECEIPT_ID;
use crate::error::{RidelogError, Result};

const BUILTIN_JSON: &str = include_str!("../../../data/timestamp_overrides.json");

lazy_static! {
    static ref BUILTIN: TimestampOverrides = TimestampOverrides::from_json(BUILTIN_JSON).unwrap();
}

/// Mapping from receipt number to the timestamp to use for it.
///
/// Serialized as a flat JSON object: `{"1013515411": "2012-12-13T10:00:00"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampOverrides {
    entries: BTreeMap<String, NaiveDateTime>,
}

impl TimestampOverrides {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table shipped with the crate.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Parse a table from JSON.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a table from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_json(&content).map_err(|e| {
            RidelogError::Config(format!("invalid override file {}: {}", path.display(), e))
        })?;
        debug!("Loaded {} timestamp overrides from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn insert(&mut self, receipt_id: impl Into<String>, timestamp: NaiveDateTime) {
        self.entries.insert(receipt_id.into(), timestamp);
    }

    pub fn get(&self, receipt_id: &str) -> Option<NaiveDateTime> {
        self.entries.get(receipt_id).copied()
    }

    /// First `Receipt #<id>` marker in `text` that has an override.
    ///
    /// The whole digit run after `#` is the id, so `Receipt #10135154119`
    /// does not pick up the entry for `1013515411`.
    pub fn lookup(&self, text: &str) -> Option<(&str, NaiveDateTime)> {
        RECEIPT_ID.captures_iter(text).find_map(|caps| {
            let id = caps.get(1)?.as_str();
            self.entries
                .get_key_value(id)
                .map(|(key, ts)| (key.as_str(), *ts))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

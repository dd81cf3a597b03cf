//! Core library for ride receipt processing.
//!
//! This crate provides:
//! - Receipt text normalization and rule-based field extraction
//!   (pickup/dropoff, completion time, price, credit)
//! - Decoding receipts from exported email messages
//! - Routing enrichment with bounded retries
//! - SQLite storage, aggregate queries and file exports

pub mod error;
pub mod models;
pub mod mail;
pub mod receipt;
pub mod enrich;
pub mod storage;
pub mod export;

pub use error::{RidelogError, Result};
pub use models::ride::{Coordinates, EnrichedRide, EnrichmentStatus, Field, ParsedRide, RawReceipt};
pub use receipt::{ReceiptParser, RideParser, ExtractionResult};
pub use receipt::rules::TimestampOverrides;
pub use enrich::{DirectionsClient, Enricher, RetryPolicy, Route, RoutingService};
pub use storage::{RideStore, TimeBucket};

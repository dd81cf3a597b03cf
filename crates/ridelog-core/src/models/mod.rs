//! Data models shared across the pipeline.

pub mod config;
pub mod ride;

pub use config::RidelogConfig;
pub use ride::{Coordinates, EnrichedRide, EnrichmentStatus, Field, ParsedRide, RawReceipt};

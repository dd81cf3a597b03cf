//! Routing enrichment of parsed rides.
//!
//! A [`RoutingService`] turns two addresses into a road distance, canonical
//! addresses and coordinates. The [`Enricher`] calls it one ride at a time,
//! bounding every attempt with a timeout and retrying transient failures a
//! fixed number of times. A ride whose enrichment fails keeps its parse
//! result and simply has no distance.

mod directions;

pub use directions::DirectionsClient;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RoutingError;
use crate::models::config::RoutingConfig;
use crate::models::ride::{Coordinates, EnrichedRide, EnrichmentStatus, Field, ParsedRide};

/// A route between two addresses as reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    /// Road-network distance in meters.
    pub distance_m: u64,
    pub start_address: String,
    pub end_address: String,
    pub start: Coordinates,
    pub end: Coordinates,
}

/// A routing/geocoding collaborator.
pub trait RoutingService {
    fn route(
        &self,
        origin: &str,
        destination: &str,
    ) -> impl Future<Output = Result<Route, RoutingError>>;
}

impl RoutingError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RoutingError::Http(e) => !e.is_decode(),
            RoutingError::Timeout(_) => true,
            RoutingError::Service { status, .. } => {
                matches!(status.as_str(), "OVER_QUERY_LIMIT" | "UNKNOWN_ERROR")
                    || status.starts_with('5')
                    || status.starts_with("429")
            }
            RoutingError::Malformed(_) => false,
        }
    }
}

/// Timeout and retry bounds for routing calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for one attempt.
    pub timeout: Duration,
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RoutingConfig::default())
    }
}

impl From<&RoutingConfig> for RetryPolicy {
    fn from(config: &RoutingConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Adds routing data to parsed rides.
pub struct Enricher<R> {
    router: R,
    policy: RetryPolicy,
}

impl<R: RoutingService> Enricher<R> {
    pub fn new(router: R) -> Self {
        Self::with_policy(router, RetryPolicy::default())
    }

    pub fn with_policy(router: R, policy: RetryPolicy) -> Self {
        Self { router, policy }
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Enrich one ride. Never fails: the outcome is recorded in
    /// [`EnrichedRide::enrichment`].
    pub async fn enrich(&self, ride: ParsedRide) -> EnrichedRide {
        let (origin, destination) = match (ride.start_location(), ride.end_location()) {
            (Field::Parsed(start), Field::Parsed(end)) => (start.clone(), end.clone()),
            _ => {
                debug!("Skipping routing: location unparseable");
                return EnrichedRide {
                    distance_m: Some(0),
                    enrichment: EnrichmentStatus::SkippedUnparseable,
                    ..EnrichedRide::unrouted(ride)
                };
            }
        };

        match self.route_with_retry(&origin, &destination).await {
            Ok(route) => EnrichedRide {
                ride,
                distance_m: Some(route.distance_m),
                start_address: Some(route.start_address),
                end_address: Some(route.end_address),
                start_coordinates: Some(route.start),
                end_coordinates: Some(route.end),
                enrichment: EnrichmentStatus::Routed,
            },
            Err(e) => {
                warn!("Routing {:?} -> {:?} failed: {}", origin, destination, e);
                EnrichedRide {
                    enrichment: EnrichmentStatus::Failed(e.to_string()),
                    ..EnrichedRide::unrouted(ride)
                }
            }
        }
    }

    /// Enrich rides one after another, preserving order. `progress` sees
    /// each ride as soon as it is done.
    pub async fn enrich_all(
        &self,
        rides: Vec<ParsedRide>,
        mut progress: impl FnMut(&EnrichedRide),
    ) -> Vec<EnrichedRide> {
        let mut enriched = Vec::with_capacity(rides.len());
        for ride in rides {
            let ride = self.enrich(ride).await;
            progress(&ride);
            enriched.push(ride);
        }
        enriched
    }

    async fn route_with_retry(&self, origin: &str, destination: &str) -> Result<Route, RoutingError> {
        let mut attempt = 0;

        loop {
            let outcome =
                match tokio::time::timeout(self.policy.timeout, self.router.route(origin, destination))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(RoutingError::Timeout(self.policy.timeout)),
                };

            match outcome {
                Ok(route) => return Ok(route),
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    debug!("Routing attempt {} failed ({}), retrying", attempt, e);
                    tokio::time::sleep(self.policy.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

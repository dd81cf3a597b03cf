//! HTTP client for a Directions-style JSON routing API.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::debug;

use super::{Route, RoutingService};
use crate::error::RoutingError;
use crate::models::config::RoutingConfig;
use crate::models::ride::Coordinates;

/// Routing client speaking the Google Directions response format.
pub struct DirectionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl DirectionsClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, RoutingError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ridelog/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn from_config(config: &RoutingConfig) -> Result<Self, RoutingError> {
        Self::new(config.base_url.clone(), config.resolved_api_key())
    }
}

impl RoutingService for DirectionsClient {
    async fn route(&self, origin: &str, destination: &str) -> Result<Route, RoutingError> {
        let mut query = vec![("origin", origin), ("destination", destination)];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("key", key));
        }

        debug!("Requesting route {:?} -> {:?}", origin, destination);

        let response = self.client.get(&self.base_url).query(&query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutingError::Service {
                status: status.as_u16().to_string(),
                message: body,
            });
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::Malformed(e.to_string()))?;
        body.into_route()
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteBody>,
}

#[derive(Debug, Deserialize)]
struct RouteBody {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    distance: Distance,
    start_address: String,
    end_address: String,
    start_location: LatLng,
    end_location: LatLng,
}

#[derive(Debug, Deserialize)]
struct Distance {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl From<LatLng> for Coordinates {
    fn from(p: LatLng) -> Self {
        Coordinates::new(p.lng, p.lat)
    }
}

impl DirectionsResponse {
    /// First leg of the first route.
    fn into_route(self) -> Result<Route, RoutingError> {
        if self.status != "OK" {
            return Err(RoutingError::Service {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            });
        }

        let leg = self
            .routes
            .into_iter()
            .next()
            .and_then(|r| r.legs.into_iter().next())
            .ok_or_else(|| RoutingError::Malformed("no route legs in response".to_string()))?;

        Ok(Route {
            distance_m: leg.distance.value,
            start_address: leg.start_address,
            end_address: leg.end_address,
            start: leg.start_location.into(),
            end: leg.end_location.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{Enricher, RetryPolicy};
    use crate::models::ride::{EnrichmentStatus, Field, ParsedRide};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer every connection with `200 OK` and `body`, counting requests.
    async fn serve(body: &'static str, hits: Arc<AtomicU32>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{}/maps/api/directions/json", addr)
    }

    const OK_RESPONSE: &str = r#"{
        "status": "OK",
        "routes": [{
            "summary": "US-101 S",
            "legs": [{
                "distance": {"text": "13.4 mi", "value": 21563},
                "duration": {"text": "19 mins", "value": 1140},
                "start_address": "1 Market St, San Francisco, CA 94105, USA",
                "end_address": "San Francisco International Airport, San Francisco, CA 94128, USA",
                "start_location": {"lat": 37.7941, "lng": -122.3951},
                "end_location": {"lat": 37.6213, "lng": -122.3790}
            }]
        }]
    }"#;

    #[test]
    fn test_parse_ok_response() {
        let body: DirectionsResponse = serde_json::from_str(OK_RESPONSE).unwrap();
        let route = body.into_route().unwrap();

        assert_eq!(route.distance_m, 21563);
        assert_eq!(route.start_address, "1 Market St, San Francisco, CA 94105, USA");
        assert_eq!(route.start, Coordinates::new(-122.3951, 37.7941));
        assert_eq!(route.end.lat_lng(), [37.6213, -122.3790]);
    }

    #[test]
    fn test_service_status_is_an_error() {
        let body: DirectionsResponse = serde_json::from_str(
            r#"{"status": "REQUEST_DENIED", "error_message": "bad key", "routes": []}"#,
        )
        .unwrap();

        match body.into_route() {
            Err(RoutingError::Service { status, message }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_routes_are_malformed() {
        let body: DirectionsResponse =
            serde_json::from_str(r#"{"status": "OK", "routes": []}"#).unwrap();
        assert!(matches!(body.into_route(), Err(RoutingError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_route_over_http() {
        let hits = Arc::new(AtomicU32::new(0));
        let url = serve(OK_RESPONSE, hits.clone()).await;
        let client = DirectionsClient::new(url, Some("test-key".to_string())).unwrap();

        let route = client.route("1 Market St", "SFO").await.unwrap();

        assert_eq!(route.distance_m, 21563);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_malformed() {
        let hits = Arc::new(AtomicU32::new(0));
        let url = serve("this is not json", hits.clone()).await;
        let client = DirectionsClient::new(url, None).unwrap();

        let err = client.route("a", "b").await.unwrap_err();
        assert!(matches!(err, RoutingError::Malformed(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_not_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let url = serve("this is not json", hits.clone()).await;
        let enricher = Enricher::with_policy(
            DirectionsClient::new(url, None).unwrap(),
            RetryPolicy {
                timeout: Duration::from_secs(5),
                max_retries: 3,
                delay: Duration::from_millis(1),
            },
        );
        let ride = ParsedRide::new(
            Field::Parsed("a".to_string()),
            Field::Parsed("b".to_string()),
            Field::Unparseable,
            None,
            0,
        );

        let enriched = enricher.enrich(ride).await;

        assert!(matches!(enriched.enrichment, EnrichmentStatus::Failed(_)));
        assert_eq!(enriched.distance_m, None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_client_builds_from_config() {
        let config = RoutingConfig {
            api_key: Some("test-key".to_string()),
            ..RoutingConfig::default()
        };
        assert!(DirectionsClient::from_config(&config).is_ok());
    }
}

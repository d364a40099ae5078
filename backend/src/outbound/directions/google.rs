//! Reqwest-backed Google Directions adapter.
//!
//! This adapter owns transport details only: query parameters, timeout and
//! HTTP error mapping, and JSON decoding into a domain route estimate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::DirectionsResponseDto;
use crate::domain::GeoPoint;
use crate::domain::ports::{RouteEstimate, RouteEstimateSource, RouteEstimateSourceError};

/// Public Directions endpoint.
pub const GOOGLE_DIRECTIONS_ENDPOINT: &str =
    "https://maps.googleapis.com/maps/api/directions/json";

/// Directions source that performs one GET per estimate.
pub struct GoogleDirectionsSource {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GoogleDirectionsSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl RouteEstimateSource for GoogleDirectionsSource {
    async fn estimate(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteEstimate, RouteEstimateSourceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("origin", coordinate_param(origin)),
                ("destination", coordinate_param(destination)),
                ("mode", "driving".to_owned()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status));
        }
        parse_estimate(body.as_ref())
    }
}

fn coordinate_param(point: GeoPoint) -> String {
    format!("{},{}", point.latitude(), point.longitude())
}

fn parse_estimate(body: &[u8]) -> Result<RouteEstimate, RouteEstimateSourceError> {
    let decoded: DirectionsResponseDto = serde_json::from_slice(body).map_err(|error| {
        RouteEstimateSourceError::decode(format!("invalid Directions JSON payload: {error}"))
    })?;
    if decoded.status != "OK" {
        let status = match decoded.error_message {
            Some(message) => format!("{}: {message}", decoded.status),
            None => decoded.status,
        };
        return Err(RouteEstimateSourceError::provider(status));
    }
    let route = decoded
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| RouteEstimateSourceError::decode("response holds no routes"))?;
    route
        .into_domain_estimate()
        .map_err(RouteEstimateSourceError::decode)
}

fn map_transport_error(error: reqwest::Error) -> RouteEstimateSourceError {
    RouteEstimateSourceError::transport(error.to_string())
}

fn map_status_error(status: StatusCode) -> RouteEstimateSourceError {
    // The response body may echo the API key, so only the status is kept.
    RouteEstimateSourceError::transport(format!("status {}", status.as_u16()))
}

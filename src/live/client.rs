use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use super::error::LiveSignalError;
use super::types::LiveCongestion;
use crate::geo::GeoPoint;
use crate::traffic::CongestionLevel;

/// Source of live congestion readings around a point.
#[async_trait]
pub trait CongestionProvider: Send + Sync {
    async fn query(&self, point: GeoPoint, radius_m: u32) -> Result<LiveCongestion, LiveSignalError>;
}

/// Wire shape returned by the congestion service
#[derive(Debug, Deserialize)]
struct CongestionResponse {
    congestion: String,
    #[serde(default)]
    road_class: Option<String>,
}

/// Congestion provider backed by an HTTP JSON service.
///
/// Issues `GET {endpoint}?lat=..&lng=..&radius=..` with a bearer token and
/// expects `{"congestion": "...", "road_class": "..."}` back.
#[derive(Debug, Clone)]
pub struct HttpCongestionProvider {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

/// Install the ring crypto provider for rustls (required for rustls 0.23+).
/// Safe to call more than once.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Create an HTTP congestion provider for the given endpoint and API key
pub fn create_provider(endpoint: &str, api_key: &str) -> Result<HttpCongestionProvider, LiveSignalError> {
    install_crypto_provider();
    let endpoint =
        Url::parse(endpoint).map_err(|_| LiveSignalError::InvalidEndpoint(endpoint.to_string()))?;
    let client = reqwest::Client::builder()
        .user_agent(concat!("site-scout/", env!("CARGO_PKG_VERSION")))
        .build()?;

    Ok(HttpCongestionProvider {
        client,
        endpoint,
        api_key: api_key.to_string(),
    })
}

impl HttpCongestionProvider {
    fn query_url(&self, point: GeoPoint, radius_m: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("lat", &format!("{:.6}", point.lat))
            .append_pair("lng", &format!("{:.6}", point.lng))
            .append_pair("radius", &radius_m.to_string());
        url
    }
}

#[async_trait]
impl CongestionProvider for HttpCongestionProvider {
    async fn query(&self, point: GeoPoint, radius_m: u32) -> Result<LiveCongestion, LiveSignalError> {
        let response = self
            .client
            .get(self.query_url(point, radius_m))
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LiveSignalError::Status(status.as_u16()));
        }

        let body: CongestionResponse = response
            .json()
            .await
            .map_err(|e| LiveSignalError::Decode(e.to_string()))?;

        Ok(LiveCongestion {
            congestion: CongestionLevel::parse(&body.congestion),
            road_class: body.road_class,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint_rejected() {
        let err = create_provider("not a url", "key").unwrap_err();
        assert!(matches!(err, LiveSignalError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_query_url_carries_point_and_radius() {
        let provider = create_provider("https://congestion.invalid/v1/flow?units=metric", "key").unwrap();
        let url = provider.query_url(GeoPoint::new(30.2672, -97.7431), 500);
        let query = url.query().unwrap();
        assert!(query.starts_with("units=metric"));
        assert!(query.contains("lat=30.267200"));
        assert!(query.contains("lng=-97.743100"));
        assert!(query.contains("radius=500"));
    }

    #[test]
    fn test_response_parsing() {
        let body: CongestionResponse =
            serde_json::from_str(r#"{"congestion": "Heavy", "road_class": "arterial"}"#).unwrap();
        assert_eq!(CongestionLevel::parse(&body.congestion), CongestionLevel::Heavy);
        assert_eq!(body.road_class.as_deref(), Some("arterial"));

        let body: CongestionResponse = serde_json::from_str(r#"{"congestion": "low"}"#).unwrap();
        assert!(body.road_class.is_none());
    }
}

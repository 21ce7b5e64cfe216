//! Nominatim-compatible geocoding client
//!
//! `GET {base_url}/search?q=<text>&format=json&limit=1`, expecting a JSON
//! array whose first element carries `lat`/`lon` as strings. The upstream
//! rejects anonymous clients, so a User-Agent is mandatory.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use casemap_common::config::GeocodingConfig;
use reqwest::{header, Client};
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::types::{GeoPoint, GeocodeError, Geocoder};

/// One search hit; other fields are ignored
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// HTTP geocoder client
pub struct NominatimClient {
    http_client: Client,
    search_url: String,
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        if user_agent.trim().is_empty() {
            return Err(GeocodeError::Config(
                "a User-Agent identifying this client is required".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(user_agent)
                .map_err(|e| GeocodeError::Config(format!("invalid User-Agent: {}", e)))?,
        );

        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GeocodeError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            search_url: format!("{}/search", base_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(config: &GeocodingConfig) -> Result<Self, GeocodeError> {
        Self::new(
            &config.base_url,
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        debug!(query = %query, "Querying geocoder");

        let response = self
            .http_client
            .get(&self.search_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let hits: Vec<SearchHit> = response
            .json()
            .await
            .map_err(|e| GeocodeError::Parse(e.to_string()))?;

        let Some(hit) = hits.into_iter().next() else {
            return Ok(None);
        };

        let latitude = BigDecimal::from_str(hit.lat.trim())
            .map_err(|e| GeocodeError::Parse(format!("lat '{}': {}", hit.lat, e)))?;
        let longitude = BigDecimal::from_str(hit.lon.trim())
            .map_err(|e| GeocodeError::Parse(format!("lon '{}': {}", hit.lon, e)))?;

        debug!(
            query = %query,
            place = hit.display_name.as_deref().unwrap_or(""),
            "Geocoder hit"
        );

        Ok(Some(GeoPoint {
            latitude,
            longitude,
        }))
    }
}

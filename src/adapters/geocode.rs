use crate::config::BatchConfig;
use crate::domain::model::{GeocodeOutcome, GeocodeResult};
use crate::domain::ports::Geocoder;
use crate::utils::error::{GeocodeError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// 只有第一筆候選結果會被解碼，其餘保留為原始 JSON
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Option<Vec<serde_json::Value>>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    formatted_address: String,
    geometry: Geometry,
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Google Geocoding `json` 端點的用戶端
pub struct GeocodeClient {
    client: Client,
    endpoint: String,
    api_key: String,
    region: String,
}

impl GeocodeClient {
    pub fn new(config: &BatchConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            region: config.region.clone(),
        })
    }

    /// `<endpoint>/json?address=<address>, <region>&key=<key>`
    pub fn request_url(&self, address: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/json", self.endpoint)).map_err(|e| {
            GeocodeError::InvalidConfigValueError {
                field: "geocoder.endpoint".to_string(),
                value: self.endpoint.clone(),
                reason: format!("Invalid URL format: {}", e),
            }
        })?;

        url.query_pairs_mut()
            .append_pair("address", &format!("{}, {}", address, self.region))
            .append_pair("key", &self.api_key);

        Ok(url)
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn geocode(&self, address: &str) -> Result<GeocodeOutcome> {
        let url = self.request_url(address)?;
        tracing::debug!("📡 Geocoding request for: {}", address);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("⚠️ Request failed for '{}': {}", address, e);
                return Ok(GeocodeOutcome::Unresolved {
                    reason: format!("transport error: {}", e),
                });
            }
        };

        let status = response.status();
        tracing::debug!("📡 API response status: {}", status);

        if !status.is_success() {
            return Ok(GeocodeOutcome::Unresolved {
                reason: format!("HTTP {}", status),
            });
        }

        let body = response.text().await?;
        let payload: GeocodeResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::UnexpectedResponse {
                message: format!("could not decode payload for '{}': {}", address, e),
            })?;

        let service_status = payload.status.unwrap_or_default();
        match payload.results.unwrap_or_default().into_iter().next() {
            Some(first) => {
                let candidate: Candidate = serde_json::from_value(first).map_err(|e| {
                    GeocodeError::UnexpectedResponse {
                        message: format!("could not decode first candidate for '{}': {}", address, e),
                    }
                })?;
                Ok(GeocodeOutcome::Resolved(GeocodeResult {
                    formatted_address: candidate.formatted_address,
                    latitude: candidate.geometry.location.lat,
                    longitude: candidate.geometry.location.lng,
                    place_id: candidate.place_id,
                }))
            }
            None => {
                let reason = match payload.error_message {
                    Some(message) => format!("{} ({})", service_status, message),
                    None => format!("{} (no results)", service_status),
                };
                Ok(GeocodeOutcome::Unresolved { reason })
            }
        }
    }
}

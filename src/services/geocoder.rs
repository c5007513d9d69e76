//! Postcode geocoding
//!
//! Resolves a postcode to a latitude/longitude pair through postcodes.io.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Something that can turn a postcode into (latitude, longitude)
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, postcode: &str) -> AppResult<(f64, f64)>;
}

/// postcodes.io client
pub struct PostcodesIo {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    result: Option<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl PostcodesIo {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn lookup_url(&self, postcode: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Internal(format!("Invalid postcode API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Postcode API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("postcodes")
            .push(postcode);
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for PostcodesIo {
    async fn locate(&self, postcode: &str) -> AppResult<(f64, f64)> {
        let url = self.lookup_url(postcode)?;
        debug!(%url, "Looking up postcode");

        let response = self.client.get(url).send().await?;

        // postcodes.io answers unknown postcodes with 404 and a JSON error body
        if response.status() == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        if !response.status().is_success() {
            return Err(AppError::NetworkFailure(format!(
                "Postcode lookup returned {}",
                response.status()
            )));
        }

        let body: LookupResponse = response.json().await?;
        location_from(body)
    }
}

fn location_from(body: LookupResponse) -> AppResult<(f64, f64)> {
    match body.result {
        Some(LookupResult {
            latitude: Some(lat),
            longitude: Some(lon),
        }) => Ok((lat, lon)),
        _ => Err(not_found()),
    }
}

fn not_found() -> AppError {
    AppError::ValidationFailure("Could not find location for the provided postcode".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_url_escapes_postcode() {
        let geocoder = PostcodesIo::new("https://api.postcodes.io", Duration::from_secs(1)).unwrap();
        let url = geocoder.lookup_url("NE25 9UZ").unwrap();
        assert_eq!(url.as_str(), "https://api.postcodes.io/postcodes/NE25%209UZ");
    }

    #[test]
    fn test_lookup_url_with_trailing_slash() {
        let geocoder = PostcodesIo::new("http://localhost:9000/", Duration::from_secs(1)).unwrap();
        let url = geocoder.lookup_url("W1D 1NU").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/postcodes/W1D%201NU");
    }

    #[test]
    fn test_location_from_response() {
        let body: LookupResponse = serde_json::from_str(
            r#"{"status": 200, "result": {"postcode": "NE25 9UZ", "latitude": 55.0478, "longitude": -1.4827}}"#,
        )
        .unwrap();
        assert_eq!(location_from(body).unwrap(), (55.0478, -1.4827));
    }

    #[test]
    fn test_location_missing_coordinates() {
        let body: LookupResponse =
            serde_json::from_str(r#"{"status": 200, "result": {"latitude": null, "longitude": null}}"#)
                .unwrap();
        assert!(matches!(location_from(body), Err(AppError::ValidationFailure(_))));

        let body: LookupResponse = serde_json::from_str(r#"{"status": 404, "error": "Invalid postcode"}"#).unwrap();
        assert!(matches!(location_from(body), Err(AppError::ValidationFailure(_))));
    }
}

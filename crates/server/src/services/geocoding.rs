//! Kakao Local API client for address geocoding and place search.

use std::time::Duration;

use muhan_core::Coordinates;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kakao Local API base URL.
const BASE_URL: &str = "https://dapi.kakao.com/v2/local";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest page size the keyword search accepts.
const MAX_PLACE_RESULTS: u32 = 15;

/// Errors from the geocoding provider.
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GeocodingError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// A geocoded address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// One keyword search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: String,
    pub road_address: Option<String>,
    pub category: Option<String>,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Kilometres from the search origin, when one was given.
    pub distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct KakaoResponse<T> {
    documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct AddressDocument {
    address_name: String,
    x: String,
    y: String,
}

#[derive(Debug, Deserialize)]
struct PlaceDocument {
    id: String,
    place_name: String,
    address_name: String,
    #[serde(default)]
    road_address_name: String,
    #[serde(default)]
    category_name: String,
    #[serde(default)]
    phone: String,
    x: String,
    y: String,
    /// Metres, as a string; empty without an origin.
    #[serde(default)]
    distance: String,
}

fn non_empty(s: String) -> Option<String> {
    (!s.trim().is_empty()).then_some(s)
}

/// Kakao reports longitude as `x` and latitude as `y`, both strings.
fn parse_xy(x: &str, y: &str) -> Result<(f64, f64), GeocodingError> {
    let lng = x
        .parse::<f64>()
        .map_err(|e| GeocodingError::Parse(format!("invalid x '{x}': {e}")))?;
    let lat = y
        .parse::<f64>()
        .map_err(|e| GeocodingError::Parse(format!("invalid y '{y}': {e}")))?;
    Ok((lat, lng))
}

impl TryFrom<AddressDocument> for GeocodeResult {
    type Error = GeocodingError;

    fn try_from(doc: AddressDocument) -> Result<Self, Self::Error> {
        let (latitude, longitude) = parse_xy(&doc.x, &doc.y)?;
        Ok(Self {
            latitude,
            longitude,
            address: doc.address_name,
        })
    }
}

impl TryFrom<PlaceDocument> for Place {
    type Error = GeocodingError;

    fn try_from(doc: PlaceDocument) -> Result<Self, Self::Error> {
        let (latitude, longitude) = parse_xy(&doc.x, &doc.y)?;
        let distance = doc.distance.parse::<f64>().ok().map(|m| m / 1000.0);
        Ok(Self {
            id: doc.id,
            name: doc.place_name,
            address: doc.address_name,
            road_address: non_empty(doc.road_address_name),
            category: non_empty(doc.category_name),
            phone: non_empty(doc.phone),
            latitude,
            longitude,
            distance,
        })
    }
}

/// Kakao Local API client.
#[derive(Clone)]
pub struct KakaoLocalClient {
    client: reqwest::Client,
}

impl KakaoLocalClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(api_key: &SecretString) -> Result<Self, GeocodingError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("KakaoAK {}", api_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| GeocodingError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<KakaoResponse<T>, GeocodingError> {
        let response = self
            .client
            .get(format!("{BASE_URL}{path}"))
            .query(query)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GeocodingError::Parse(e.to_string()))
    }

    /// Geocode a free-form address. Returns the best match, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, GeocodingError> {
        let response: KakaoResponse<AddressDocument> = self
            .get("/search/address.json", &[("query", address.to_owned())])
            .await?;
        response
            .documents
            .into_iter()
            .next()
            .map(GeocodeResult::try_from)
            .transpose()
    }

    /// Keyword search, ordered by distance when `near` is given.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    pub async fn search_places(
        &self,
        query: &str,
        near: Option<Coordinates>,
    ) -> Result<Vec<Place>, GeocodingError> {
        let mut params = vec![
            ("query", query.to_owned()),
            ("size", MAX_PLACE_RESULTS.to_string()),
        ];
        if let Some(origin) = near {
            params.push(("x", origin.longitude().to_string()));
            params.push(("y", origin.latitude().to_string()));
            params.push(("sort", "distance".to_owned()));
        }

        let response: KakaoResponse<PlaceDocument> =
            self.get("/search/keyword.json", &params).await?;
        response.documents.into_iter().map(Place::try_from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_document() {
        let body = r#"{"documents":[{"address_name":"서울 중구 세종대로 110","x":"126.978","y":"37.5665"}],"meta":{}}"#;
        let parsed: KakaoResponse<AddressDocument> = serde_json::from_str(body).unwrap();
        let result = GeocodeResult::try_from(parsed.documents.into_iter().next().unwrap()).unwrap();
        assert!((result.latitude - 37.5665).abs() < 1e-9);
        assert!((result.longitude - 126.978).abs() < 1e-9);
    }

    #[test]
    fn test_place_document_distance_in_km() {
        let body = r#"{"documents":[{"id":"1","place_name":"무한 고기","address_name":"서울 마포구",
            "road_address_name":"","category_name":"음식점 > 한식","phone":"","x":"126.9","y":"37.5","distance":"1250"}]}"#;
        let parsed: KakaoResponse<PlaceDocument> = serde_json::from_str(body).unwrap();
        let place = Place::try_from(parsed.documents.into_iter().next().unwrap()).unwrap();
        assert_eq!(place.distance, Some(1.25));
        assert_eq!(place.road_address, None);
        assert_eq!(place.category.as_deref(), Some("음식점 > 한식"));
    }

    #[test]
    fn test_bad_coordinates_are_parse_errors() {
        assert!(matches!(parse_xy("east", "1"), Err(GeocodingError::Parse(_))));
    }
}

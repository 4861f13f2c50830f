//! Address geocoding and place autocomplete.

use axum::{Json, Router, extract::State, routing::get};
use muhan_core::Coordinates;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::routes::extract::ApiQuery;
use crate::services::geocoding::{GeocodeResult, KakaoLocalClient, Place};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/geocode", get(geocode))
        .route("/places/search", get(search_places))
}

fn geocoder(state: &AppState) -> Result<&KakaoLocalClient> {
    state
        .geocoder()
        .ok_or_else(|| AppError::ServiceUnavailable("주소 검색을 사용할 수 없습니다.".to_owned()))
}

fn required_query(raw: Option<String>, message: &str) -> Result<String> {
    raw.map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest(message.to_owned()))
}

#[derive(Debug, Deserialize)]
struct GeocodeQuery {
    address: Option<String>,
}

/// `GET /api/geocode?address=`
#[instrument(skip(state))]
async fn geocode(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GeocodeQuery>,
) -> Result<Json<GeocodeResult>> {
    let address = required_query(query.address, "주소를 입력해주세요.")?;
    geocoder(&state)?
        .geocode(&address)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("주소를 찾을 수 없습니다.".to_owned()))
}

#[derive(Debug, Deserialize)]
struct PlacesQuery {
    query: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Serialize)]
struct PlacesResponse {
    places: Vec<Place>,
}

/// `GET /api/places/search?query=&lat=&lng=`
#[instrument(skip(state))]
async fn search_places(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PlacesQuery>,
) -> Result<Json<PlacesResponse>> {
    let query = required_query(params.query, "검색어를 입력해주세요.")?;
    let near = match (params.lat, params.lng) {
        (Some(lat), Some(lng)) => Some(
            Coordinates::new(lat, lng).map_err(|_| {
                AppError::BadRequest("위도 또는 경도 값이 올바르지 않습니다.".to_owned())
            })?,
        ),
        (None, None) => None,
        _ => return Err(AppError::BadRequest("위도와 경도는 함께 입력해야 합니다.".to_owned())),
    };
    let places = geocoder(&state)?.search_places(&query, near).await?;
    Ok(Json(PlacesResponse { places }))
}

//! Store search and detail routes.

use axum::{Json, Router, extract::State, routing::get};
use muhan_core::{RankedStore, StoreId};
use serde::Serialize;
use tracing::instrument;

use crate::db;
use crate::db::stores::CategoryRow;
use crate::error::{AppError, Result};
use crate::models::{StoreListResponse, StoreResponse};
use crate::routes::extract::{ApiPath, ApiQuery};
use crate::services::store_search::{self, SearchRequest, StoreSearchParams};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stores", get(list))
        .route("/stores/filter", get(filter))
        .route("/stores/backup-filter", get(backup_filter))
        .route("/stores/{id}", get(show))
        .route("/categories", get(categories))
}

/// `GET /api/stores`
#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StoreSearchParams>,
) -> Result<Json<StoreListResponse>> {
    let request = SearchRequest::from_params(params)?;
    Ok(Json(store_search::nearby(state.pool(), &request).await?))
}

/// `GET /api/stores/filter`
#[instrument(skip(state))]
async fn filter(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StoreSearchParams>,
) -> Result<Json<StoreListResponse>> {
    let request = SearchRequest::from_params(params)?;
    Ok(Json(store_search::filtered(state.pool(), &request).await?))
}

/// `GET /api/stores/backup-filter`
#[instrument(skip(state))]
async fn backup_filter(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StoreSearchParams>,
) -> Result<Json<StoreListResponse>> {
    let request = SearchRequest::from_params(params)?;
    Ok(Json(store_search::backup(state.pool(), &request).await?))
}

/// `GET /api/stores/{id}`
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<StoreId>,
) -> Result<Json<StoreResponse>> {
    let store = db::stores::get(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("가게를 찾을 수 없습니다.".to_owned()))?;
    let stats = db::stores::review_stats(state.pool(), &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    Ok(Json(StoreResponse::new(RankedStore::unranked(store), stats)))
}

#[derive(Serialize)]
struct CategoriesResponse {
    categories: Vec<CategoryRow>,
}

/// `GET /api/categories`
async fn categories(State(state): State<AppState>) -> Result<Json<CategoriesResponse>> {
    let categories = db::stores::categories(state.pool()).await?;
    Ok(Json(CategoriesResponse { categories }))
}

//! Favorite store routes. All require a signed-in user.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, Utc};
use muhan_core::{FavoriteId, StoreId};
use serde::Serialize;
use tracing::instrument;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{FavoriteBody, StoreResponse};
use crate::routes::extract::{ApiJson, ApiPath};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list).post(add))
        .route("/favorites/{store_id}", get(status).delete(remove))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteResponse {
    id: FavoriteId,
    created_at: DateTime<Utc>,
    store: StoreResponse,
}

#[derive(Serialize)]
struct FavoritesResponse {
    favorites: Vec<FavoriteResponse>,
}

/// `GET /api/favorites`, newest first.
async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<FavoritesResponse>> {
    let favorites = db::favorites::list(state.pool(), user.id).await?;
    let ids: Vec<StoreId> = favorites.iter().map(|f| f.store.store.id).collect();
    let mut stats = if ids.is_empty() {
        std::collections::HashMap::new()
    } else {
        db::stores::review_stats(state.pool(), &ids).await?
    };

    let favorites = favorites
        .into_iter()
        .map(|f| {
            let s = stats.remove(&f.store.store.id).unwrap_or_default();
            FavoriteResponse {
                id: f.id,
                created_at: f.created_at,
                store: StoreResponse::new(f.store, s),
            }
        })
        .collect();
    Ok(Json(FavoritesResponse { favorites }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddedResponse {
    id: FavoriteId,
    store_id: StoreId,
    created_at: DateTime<Utc>,
}

/// `POST /api/favorites {storeId}`: 409 if already saved, 404 for an unknown
/// store.
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<FavoriteBody>,
) -> Result<(StatusCode, Json<AddedResponse>)> {
    let (id, created_at) = db::favorites::add(state.pool(), user.id, body.store_id)
        .await
        .map_err(|e| match e {
            db::RepositoryError::Conflict(_) => {
                AppError::Conflict("이미 찜한 가게입니다.".to_owned())
            }
            db::RepositoryError::NotFound => {
                AppError::NotFound("가게를 찾을 수 없습니다.".to_owned())
            }
            other => other.into(),
        })?;
    Ok((
        StatusCode::CREATED,
        Json(AddedResponse {
            id,
            store_id: body.store_id,
            created_at,
        }),
    ))
}

/// `DELETE /api/favorites/{storeId}`. Removing a store that is not saved is
/// not an error.
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(store_id): ApiPath<StoreId>,
) -> Result<StatusCode> {
    let removed = db::favorites::remove(state.pool(), user.id, store_id).await?;
    tracing::debug!(removed, "favorite removed");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteStatus {
    is_favorite: bool,
}

/// `GET /api/favorites/{storeId}`
async fn status(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(store_id): ApiPath<StoreId>,
) -> Result<Json<FavoriteStatus>> {
    let is_favorite = db::favorites::contains(state.pool(), user.id, store_id).await?;
    Ok(Json(FavoriteStatus { is_favorite }))
}

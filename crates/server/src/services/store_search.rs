//! Store search: query validation and the three candidate pipelines.
//!
//! | endpoint                      | candidates                          | rating basis |
//! |-------------------------------|-------------------------------------|--------------|
//! | `/api/stores`                 | radius RPC, or default set (cap 50) | max          |
//! | `/api/stores/filter`          | radius RPC, or every store          | max          |
//! | `/api/stores/backup-filter`   | every store, haversine in memory    | mean         |
//!
//! Every path paginates in memory and attaches review statistics for the
//! returned page only.

use muhan_core::search::{
    BACKUP_RATING_BASIS, Pagination, SortOrder, StoreFilter, backup_filter, effective_radius_km,
    paginate, rank_default, rank_nearby, sort_stores,
};
use muhan_core::{Coordinates, RankedStore, RatingBasis, StoreId, parse_category_param};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use crate::db;
use crate::error::{AppError, Result};
use crate::models::StoreListResponse;

/// Raw query string of the search endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSearchParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Kilometres.
    pub radius: Option<f64>,
    pub min_rating: Option<f64>,
    /// Comma-separated category names.
    pub categories: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort: Option<String>,
    /// Kilometres; backup filter only.
    pub max_distance: Option<f64>,
}

/// A validated search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub origin: Option<Coordinates>,
    pub radius_km: f64,
    pub filter: StoreFilter,
    pub sort: Option<SortOrder>,
    pub pagination: Pagination,
}

fn bad_request(message: &str) -> AppError {
    AppError::BadRequest(message.to_owned())
}

impl SearchRequest {
    /// Validate raw parameters.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when only one of `lat`/`lng` is given, either is out
    /// of range, the radius or `maxDistance` is not positive, `minRating` is
    /// outside 0–5, or `sort` is unknown. An explicit radius also becomes the
    /// backup filter's distance cut when `maxDistance` is absent.
    pub fn from_params(params: StoreSearchParams) -> Result<Self> {
        let origin = match (params.lat, params.lng) {
            (Some(lat), Some(lng)) => Some(
                Coordinates::new(lat, lng)
                    .map_err(|_| bad_request("위도 또는 경도 값이 올바르지 않습니다."))?,
            ),
            (None, None) => None,
            _ => return Err(bad_request("위도와 경도는 함께 입력해야 합니다.")),
        };

        let radius_km = effective_radius_km(params.radius)
            .ok_or_else(|| bad_request("검색 반경은 0보다 커야 합니다."))?;

        let max_distance_km = params
            .max_distance
            .or(params.radius)
            .map(|d| {
                effective_radius_km(Some(d))
                    .ok_or_else(|| bad_request("최대 거리는 0보다 커야 합니다."))
            })
            .transpose()?;

        if let Some(min) = params.min_rating
            && !(0.0..=5.0).contains(&min)
        {
            return Err(bad_request("최소 평점은 0에서 5 사이여야 합니다."));
        }

        let sort = params
            .sort
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<SortOrder>)
            .transpose()
            .map_err(|_| bad_request("정렬 기준은 distance 또는 rating 이어야 합니다."))?;

        let query = params
            .q
            .map(|q| q.trim().to_owned())
            .filter(|q| !q.is_empty());

        Ok(Self {
            origin,
            radius_km,
            filter: StoreFilter {
                min_rating: params.min_rating,
                rating_basis: RatingBasis::Max,
                categories: parse_category_param(params.categories.as_deref()),
                query,
                max_distance_km,
            },
            sort,
            pagination: Pagination::new(params.page, params.limit),
        })
    }
}

async fn respond(
    pool: &PgPool,
    ranked: Vec<RankedStore>,
    pagination: Pagination,
    basis: RatingBasis,
) -> Result<StoreListResponse> {
    let page = paginate(ranked, pagination);
    let ids: Vec<StoreId> = page.items.iter().map(|r| r.store.id).collect();
    let stats = if ids.is_empty() {
        std::collections::HashMap::new()
    } else {
        db::stores::review_stats(pool, &ids).await?
    };
    Ok(StoreListResponse::from_page(page, &stats, basis))
}

/// `GET /api/stores`: nearby stores, or the default recommendations without a
/// location.
///
/// # Errors
///
/// Returns an error if a database call fails.
#[instrument(skip(pool), fields(has_origin = request.origin.is_some()))]
pub async fn nearby(pool: &PgPool, request: &SearchRequest) -> Result<StoreListResponse> {
    let ranked = match request.origin {
        Some(origin) => {
            let candidates = db::stores::nearby(pool, origin, request.radius_km).await?;
            rank_nearby(candidates, &request.filter)
        }
        None => {
            let candidates = db::stores::default_recommended(pool).await?;
            rank_default(candidates, &request.filter)
        }
    };
    tracing::debug!(matches = ranked.len(), "nearby search");
    respond(pool, ranked, request.pagination, request.filter.rating_basis).await
}

/// `GET /api/stores/filter`: like [`nearby`] but over every store when no
/// location is given, with an optional sort.
///
/// # Errors
///
/// Returns an error if a database call fails.
#[instrument(skip(pool), fields(has_origin = request.origin.is_some()))]
pub async fn filtered(pool: &PgPool, request: &SearchRequest) -> Result<StoreListResponse> {
    let candidates = match request.origin {
        Some(origin) => db::stores::nearby(pool, origin, request.radius_km).await?,
        None => db::stores::all(pool)
            .await?
            .into_iter()
            .map(RankedStore::unranked)
            .collect(),
    };
    let mut ranked = rank_nearby(candidates, &request.filter);
    if let Some(order) = request.sort {
        sort_stores(&mut ranked, order, request.filter.rating_basis);
    }
    respond(pool, ranked, request.pagination, request.filter.rating_basis).await
}

/// `GET /api/stores/backup-filter`: in-memory search that never calls the
/// geospatial RPC.
///
/// `maxDistance` limits results when given; otherwise an explicit `radius`
/// does. Without either, distances are attached but nothing is cut.
///
/// # Errors
///
/// Returns an error if a database call fails.
#[instrument(skip(pool), fields(has_origin = request.origin.is_some()))]
pub async fn backup(pool: &PgPool, request: &SearchRequest) -> Result<StoreListResponse> {
    let stores = db::stores::all(pool).await?;
    let ranked = backup_filter(stores, request.origin, &request.filter, request.sort);
    respond(pool, ranked, request.pagination, BACKUP_RATING_BASIS).await
}

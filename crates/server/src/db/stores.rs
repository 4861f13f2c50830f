//! Store catalogue queries.
//!
//! Rows come back with categories in one of two JSON shapes: the RPC
//! functions aggregate plain names, the relational select aggregates
//! `{"category": {"name": ..}}` join objects. Both are collapsed into a
//! [`CategorySet`] here so nothing above this module sees the difference.

use std::collections::HashMap;

use muhan_core::types::review::aggregate_by_store;
use muhan_core::{
    CategoryId, CategorySet, Coordinates, ExternalRatings, LegacyPosition, RankedStore,
    RawCategories, ReviewStats, Store, StoreId,
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;

const STORE_COLUMNS: &str = "
    s.id, s.name, s.address, s.latitude, s.longitude, s.position_x, s.position_y,
    s.naver_rating, s.kakao_rating, s.description, s.open_hours, s.price, s.image_urls";

/// Relational select with nested category join objects.
fn relational_select(where_clause: &str) -> String {
    format!(
        "SELECT {STORE_COLUMNS},
            COALESCE(
                (SELECT jsonb_agg(jsonb_build_object('category', jsonb_build_object('name', c.name)))
                 FROM store_categories sc
                 JOIN categories c ON c.id = sc.category_id
                 WHERE sc.store_id = s.id),
                '[]'::jsonb
            ) AS categories,
            NULL::float8 AS distance_km
         FROM stores s
         {where_clause}
         ORDER BY s.id"
    )
}

/// A store row as returned by either the RPC functions or a plain select.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub naver_rating: Option<f64>,
    pub kakao_rating: Option<f64>,
    pub description: Option<String>,
    pub open_hours: Option<String>,
    pub price: Option<String>,
    pub image_urls: Vec<String>,
    pub categories: Option<serde_json::Value>,
    pub distance_km: Option<f64>,
}

impl StoreRow {
    /// Normalize into the domain shape.
    #[must_use]
    pub fn into_ranked(self) -> RankedStore {
        let position = self
            .latitude
            .zip(self.longitude)
            .and_then(|(lat, lng)| Coordinates::new(lat, lng).ok());
        let legacy_position = self
            .position_x
            .zip(self.position_y)
            .map(|(x, y)| LegacyPosition { x, y });
        let categories = self
            .categories
            .map(RawCategories::from_json)
            .map(CategorySet::from)
            .unwrap_or_default();

        RankedStore::new(
            Store {
                id: self.id,
                name: self.name,
                address: self.address,
                position,
                legacy_position,
                categories,
                ratings: ExternalRatings::new(self.naver_rating, self.kakao_rating),
                description: self.description,
                open_hours: self.open_hours,
                price: self.price,
                image_urls: self.image_urls,
            },
            self.distance_km,
        )
    }
}

const NEARBY_SQL: &str = "SELECT * FROM get_nearby_stores($1, $2, $3)";
const DEFAULT_RECOMMENDED_SQL: &str = "SELECT * FROM get_default_recommended_stores()";

/// Stores within `radius_km` of `origin`, nearest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the RPC call fails.
#[instrument(skip(pool))]
pub async fn nearby(
    pool: &PgPool,
    origin: Coordinates,
    radius_km: f64,
) -> Result<Vec<RankedStore>, RepositoryError> {
    let rows = sqlx::query_as::<_, StoreRow>(NEARBY_SQL)
        .bind(origin.latitude())
        .bind(origin.longitude())
        .bind(radius_km)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(StoreRow::into_ranked).collect())
}

/// The default recommendation set for callers without a location.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the RPC call fails.
#[instrument(skip(pool))]
pub async fn default_recommended(pool: &PgPool) -> Result<Vec<RankedStore>, RepositoryError> {
    let rows = sqlx::query_as::<_, StoreRow>(DEFAULT_RECOMMENDED_SQL)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(StoreRow::into_ranked).collect())
}

/// Every store, without distances.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
#[instrument(skip(pool))]
pub async fn all(pool: &PgPool) -> Result<Vec<Store>, RepositoryError> {
    let rows = sqlx::query_as::<_, StoreRow>(&relational_select(""))
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_ranked().store)
        .collect())
}

/// A single store by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: StoreId) -> Result<Option<Store>, RepositoryError> {
    let row = sqlx::query_as::<_, StoreRow>(&relational_select("WHERE s.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.into_ranked().store))
}

/// Whether a store exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn exists(pool: &PgPool, id: StoreId) -> Result<bool, RepositoryError> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM stores WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

/// Review statistics for the given stores from one `reviews` fetch.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn review_stats(
    pool: &PgPool,
    ids: &[StoreId],
) -> Result<HashMap<StoreId, ReviewStats>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let raw_ids: Vec<i32> = ids.iter().map(StoreId::as_i32).collect();
    let rows: Vec<(StoreId, i16)> =
        sqlx::query_as("SELECT store_id, rating FROM reviews WHERE store_id = ANY($1)")
            .bind(&raw_ids)
            .fetch_all(pool)
            .await?;
    Ok(aggregate_by_store(rows.into_iter().filter_map(
        |(store_id, rating)| u8::try_from(rating).ok().map(|r| (store_id, r)),
    )))
}

/// A category with how many stores carry it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub id: CategoryId,
    pub name: String,
    pub store_count: i64,
}

/// All categories, alphabetically.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn categories(pool: &PgPool) -> Result<Vec<CategoryRow>, RepositoryError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT c.id, c.name, COUNT(sc.store_id) AS store_count
         FROM categories c
         LEFT JOIN store_categories sc ON sc.category_id = c.id
         GROUP BY c.id, c.name
         ORDER BY c.name",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

//! Favorite stores.

use chrono::{DateTime, Utc};
use muhan_core::{FavoriteId, RankedStore, StoreId, UserId};
use sqlx::PgPool;
use tracing::instrument;

use super::stores::StoreRow;
use super::{RepositoryError, classify};

/// A favorite row joined with its store.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FavoriteRow {
    favorite_id: FavoriteId,
    favorited_at: DateTime<Utc>,
    #[sqlx(flatten)]
    store: StoreRow,
}

/// A saved store.
#[derive(Debug, Clone)]
pub struct Favorite {
    pub id: FavoriteId,
    pub created_at: DateTime<Utc>,
    pub store: RankedStore,
}

/// The user's favorites, most recently added first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(pool: &PgPool, user_id: UserId) -> Result<Vec<Favorite>, RepositoryError> {
    let rows = sqlx::query_as::<_, FavoriteRow>(
        "SELECT f.id AS favorite_id, f.created_at AS favorited_at,
                s.id, s.name, s.address, s.latitude, s.longitude, s.position_x, s.position_y,
                s.naver_rating, s.kakao_rating, s.description, s.open_hours, s.price, s.image_urls,
                COALESCE(
                    (SELECT jsonb_agg(jsonb_build_object('category', jsonb_build_object('name', c.name)))
                     FROM store_categories sc
                     JOIN categories c ON c.id = sc.category_id
                     WHERE sc.store_id = s.id),
                    '[]'::jsonb
                ) AS categories,
                NULL::float8 AS distance_km
         FROM favorites f
         JOIN stores s ON s.id = f.store_id
         WHERE f.user_id = $1
         ORDER BY f.created_at DESC, f.id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Favorite {
            id: row.favorite_id,
            created_at: row.favorited_at,
            store: row.store.into_ranked(),
        })
        .collect())
}

/// Save a store.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if already saved, or
/// `RepositoryError::NotFound` if the store does not exist.
#[instrument(skip(pool))]
pub async fn add(
    pool: &PgPool,
    user_id: UserId,
    store_id: StoreId,
) -> Result<(FavoriteId, DateTime<Utc>), RepositoryError> {
    sqlx::query_as::<_, (FavoriteId, DateTime<Utc>)>(
        "INSERT INTO favorites (user_id, store_id) VALUES ($1, $2)
         RETURNING id, created_at",
    )
    .bind(user_id)
    .bind(store_id)
    .fetch_one(pool)
    .await
    .map_err(|e| classify(e, "store is already a favorite"))
}

/// Remove a saved store. Returns whether a row was deleted.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
#[instrument(skip(pool))]
pub async fn remove(
    pool: &PgPool,
    user_id: UserId,
    store_id: StoreId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND store_id = $2")
        .bind(user_id)
        .bind(store_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Whether the user has saved the store.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn contains(
    pool: &PgPool,
    user_id: UserId,
    store_id: StoreId,
) -> Result<bool, RepositoryError> {
    let found: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 AND store_id = $2)",
    )
    .bind(user_id)
    .bind(store_id)
    .fetch_one(pool)
    .await?;
    Ok(found)
}

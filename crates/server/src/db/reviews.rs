//! Review queries.

use chrono::{DateTime, Utc};
use muhan_core::{ReviewId, ReviewRating, StoreId, SubRatings, UserId};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use super::{RepositoryError, classify};
use muhan_core::search::Pagination;

const REVIEW_COLUMNS: &str = "
    r.id, r.user_id, r.store_id, r.rating, r.content, r.images,
    r.taste_rating, r.value_rating, r.service_rating, r.cleanliness_rating,
    r.tags, r.created_at, r.updated_at";

/// A stored review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub rating: i16,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub taste_rating: Option<i16>,
    pub value_rating: Option<i16>,
    pub service_rating: Option<i16>,
    pub cleanliness_rating: Option<i16>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A review with its author's public profile.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
}

/// A review with the name of the store it is about.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithStore {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub store_name: String,
}

/// Validated review content for inserts and updates.
#[derive(Debug, Clone)]
pub struct ReviewInput {
    pub rating: ReviewRating,
    pub content: String,
    pub images: Vec<String>,
    pub sub_ratings: SubRatings,
    pub tags: Vec<String>,
}

fn sub(r: Option<ReviewRating>) -> Option<i16> {
    r.map(|r| i16::from(r.get()))
}

/// Get a review by id.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
    let review = sqlx::query_as::<_, Review>(&format!(
        "SELECT {REVIEW_COLUMNS} FROM reviews r WHERE r.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(review)
}

/// The caller's existing review for a store, if any.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_for_user_and_store(
    pool: &PgPool,
    user_id: UserId,
    store_id: StoreId,
) -> Result<Option<ReviewId>, RepositoryError> {
    let id = sqlx::query_scalar::<_, ReviewId>(
        "SELECT id FROM reviews WHERE user_id = $1 AND store_id = $2",
    )
    .bind(user_id)
    .bind(store_id)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Creation time of the user's most recent review.
///
/// With `store_id` set only reviews on that store count.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn last_created_at(
    pool: &PgPool,
    user_id: UserId,
    store_id: Option<StoreId>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    let last = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(created_at) FROM reviews
         WHERE user_id = $1 AND ($2::int IS NULL OR store_id = $2)",
    )
    .bind(user_id)
    .bind(store_id)
    .fetch_one(pool)
    .await?;
    Ok(last)
}

/// Insert a new review.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the user already reviewed the store
/// (the unique constraint catches concurrent submissions), or
/// `RepositoryError::NotFound` if the store does not exist.
#[instrument(skip(pool, input), fields(user_id = %user_id, store_id = %store_id))]
pub async fn create(
    pool: &PgPool,
    user_id: UserId,
    store_id: StoreId,
    input: &ReviewInput,
) -> Result<Review, RepositoryError> {
    sqlx::query_as::<_, Review>(&format!(
        "INSERT INTO reviews AS r (
             user_id, store_id, rating, content, images,
             taste_rating, value_rating, service_rating, cleanliness_rating, tags
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING {REVIEW_COLUMNS}"
    ))
    .bind(user_id)
    .bind(store_id)
    .bind(i16::from(input.rating.get()))
    .bind(&input.content)
    .bind(&input.images)
    .bind(sub(input.sub_ratings.taste))
    .bind(sub(input.sub_ratings.value))
    .bind(sub(input.sub_ratings.service))
    .bind(sub(input.sub_ratings.cleanliness))
    .bind(&input.tags)
    .fetch_one(pool)
    .await
    .map_err(|e| classify(e, "review already exists for this store"))
}

/// Replace the editable fields of a review.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the review does not exist.
#[instrument(skip(pool, input))]
pub async fn update(
    pool: &PgPool,
    id: ReviewId,
    input: &ReviewInput,
) -> Result<Review, RepositoryError> {
    sqlx::query_as::<_, Review>(&format!(
        "UPDATE reviews AS r SET
             rating = $2, content = $3, images = $4,
             taste_rating = $5, value_rating = $6, service_rating = $7,
             cleanliness_rating = $8, tags = $9, updated_at = now()
         WHERE r.id = $1
         RETURNING {REVIEW_COLUMNS}"
    ))
    .bind(id)
    .bind(i16::from(input.rating.get()))
    .bind(&input.content)
    .bind(&input.images)
    .bind(sub(input.sub_ratings.taste))
    .bind(sub(input.sub_ratings.value))
    .bind(sub(input.sub_ratings.service))
    .bind(sub(input.sub_ratings.cleanliness))
    .bind(&input.tags)
    .fetch_optional(pool)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Delete a review.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if nothing was deleted.
pub async fn delete(pool: &PgPool, id: ReviewId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Reviews for a store, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_store(
    pool: &PgPool,
    store_id: StoreId,
) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
    let rows = sqlx::query_as::<_, ReviewWithAuthor>(&format!(
        "SELECT {REVIEW_COLUMNS}, p.nickname, p.avatar_url
         FROM reviews r
         LEFT JOIN profiles p ON p.id = r.user_id
         WHERE r.store_id = $1
         ORDER BY r.created_at DESC, r.id DESC"
    ))
    .bind(store_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// A user's reviews, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<ReviewWithStore>, RepositoryError> {
    let rows = sqlx::query_as::<_, ReviewWithStore>(&format!(
        "SELECT {REVIEW_COLUMNS}, s.name AS store_name
         FROM reviews r
         JOIN stores s ON s.id = r.store_id
         WHERE r.user_id = $1
         ORDER BY r.created_at DESC, r.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All reviews for moderation, newest first, with the total count.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_recent(
    pool: &PgPool,
    pagination: Pagination,
) -> Result<(Vec<ReviewWithAuthor>, u64), RepositoryError> {
    let rows = sqlx::query_as::<_, ReviewWithAuthor>(&format!(
        "SELECT {REVIEW_COLUMNS}, p.nickname, p.avatar_url
         FROM reviews r
         LEFT JOIN profiles p ON p.id = r.user_id
         ORDER BY r.created_at DESC, r.id DESC
         LIMIT $1 OFFSET $2"
    ))
    .bind(i64::from(pagination.limit()))
    .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
    .fetch_all(pool)
    .await?;
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
        .fetch_one(pool)
        .await?;
    Ok((rows, u64::try_from(total).unwrap_or_default()))
}

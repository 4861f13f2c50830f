//! Announcements.

use chrono::{DateTime, Utc};
use muhan_core::search::Pagination;
use muhan_core::{AnnouncementId, UserId, resolve_published_at};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;

const COLUMNS: &str = "id, title, content, is_important, is_published, published_at,
    author_id, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: AnnouncementId,
    pub title: String,
    pub content: String,
    pub is_important: bool,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an admin writes.
#[derive(Debug, Clone)]
pub struct AnnouncementInput {
    pub title: String,
    pub content: String,
    pub is_important: bool,
    pub is_published: bool,
}

fn total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

fn offset(pagination: Pagination) -> i64 {
    i64::try_from(pagination.offset()).unwrap_or(i64::MAX)
}

/// Published announcements, newest first, with the total count.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_published(
    pool: &PgPool,
    pagination: Pagination,
) -> Result<(Vec<Announcement>, u64), RepositoryError> {
    let rows = sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {COLUMNS} FROM announcements
         WHERE is_published
         ORDER BY published_at DESC, id DESC
         LIMIT $1 OFFSET $2"
    ))
    .bind(i64::from(pagination.limit()))
    .bind(offset(pagination))
    .fetch_all(pool)
    .await?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM announcements WHERE is_published")
        .fetch_one(pool)
        .await?;
    Ok((rows, total(count)))
}

/// Every announcement including drafts, most recently created first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list_all(
    pool: &PgPool,
    pagination: Pagination,
) -> Result<(Vec<Announcement>, u64), RepositoryError> {
    let rows = sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {COLUMNS} FROM announcements
         ORDER BY created_at DESC, id DESC
         LIMIT $1 OFFSET $2"
    ))
    .bind(i64::from(pagination.limit()))
    .bind(offset(pagination))
    .fetch_all(pool)
    .await?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM announcements")
        .fetch_one(pool)
        .await?;
    Ok((rows, total(count)))
}

/// Get an announcement by id, drafts included.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(
    pool: &PgPool,
    id: AnnouncementId,
) -> Result<Option<Announcement>, RepositoryError> {
    let row = sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {COLUMNS} FROM announcements WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Create an announcement, stamping `published_at` when it starts published.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
#[instrument(skip(pool, input), fields(title = %input.title))]
pub async fn create(
    pool: &PgPool,
    author_id: UserId,
    input: &AnnouncementInput,
    now: DateTime<Utc>,
) -> Result<Announcement, RepositoryError> {
    let published_at = resolve_published_at(false, None, input.is_published, now);
    let row = sqlx::query_as::<_, Announcement>(&format!(
        "INSERT INTO announcements (title, content, is_important, is_published, published_at, author_id)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(&input.title)
    .bind(&input.content)
    .bind(input.is_important)
    .bind(input.is_published)
    .bind(published_at)
    .bind(author_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Update an announcement, applying the publication transition rules.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the announcement does not exist.
#[instrument(skip(pool, input))]
pub async fn update(
    pool: &PgPool,
    id: AnnouncementId,
    input: &AnnouncementInput,
    now: DateTime<Utc>,
) -> Result<Announcement, RepositoryError> {
    let mut tx = pool.begin().await?;

    let current: Option<(bool, Option<DateTime<Utc>>)> = sqlx::query_as(
        "SELECT is_published, published_at FROM announcements WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let (was_published, current_published_at) = current.ok_or(RepositoryError::NotFound)?;

    let published_at =
        resolve_published_at(was_published, current_published_at, input.is_published, now);

    let row = sqlx::query_as::<_, Announcement>(&format!(
        "UPDATE announcements SET
             title = $2, content = $3, is_important = $4,
             is_published = $5, published_at = $6, updated_at = now()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(&input.title)
    .bind(&input.content)
    .bind(input.is_important)
    .bind(input.is_published)
    .bind(published_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Delete an announcement.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if nothing was deleted.
pub async fn delete(pool: &PgPool, id: AnnouncementId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

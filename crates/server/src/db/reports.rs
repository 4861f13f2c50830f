//! Review moderation reports.

use chrono::{DateTime, Utc};
use muhan_core::{ReviewId, ReviewReportId, StoreId, UserId};
use serde::Serialize;
use sqlx::PgPool;

use super::{RepositoryError, classify};

/// A report filed against a review.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReport {
    pub id: ReviewReportId,
    pub review_id: ReviewId,
    pub reporter_id: UserId,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// A report joined with the reported review, for the admin queue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportWithReview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: ReviewReport,
    pub store_id: StoreId,
    pub review_author_id: UserId,
    pub review_rating: i16,
    pub review_content: Option<String>,
}

/// File a report.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if this user already reported the
/// review, or `RepositoryError::NotFound` if the review is gone.
pub async fn create(
    pool: &PgPool,
    review_id: ReviewId,
    reporter_id: UserId,
    reason: &str,
) -> Result<ReviewReport, RepositoryError> {
    sqlx::query_as::<_, ReviewReport>(
        "INSERT INTO review_reports (review_id, reporter_id, reason)
         VALUES ($1, $2, $3)
         RETURNING id, review_id, reporter_id, reason, created_at",
    )
    .bind(review_id)
    .bind(reporter_id)
    .bind(reason)
    .fetch_one(pool)
    .await
    .map_err(|e| classify(e, "review already reported"))
}

/// All reports, newest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(pool: &PgPool) -> Result<Vec<ReportWithReview>, RepositoryError> {
    let rows = sqlx::query_as::<_, ReportWithReview>(
        "SELECT rr.id, rr.review_id, rr.reporter_id, rr.reason, rr.created_at,
                r.store_id, r.user_id AS review_author_id,
                r.rating AS review_rating, r.content AS review_content
         FROM review_reports rr
         JOIN reviews r ON r.id = rr.review_id
         ORDER BY rr.created_at DESC, rr.id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

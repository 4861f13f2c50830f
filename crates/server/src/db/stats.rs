//! Admin dashboard counters.

use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stores: i64,
    pub reviews: i64,
    pub pending_contacts: i64,
    pub published_announcements: i64,
    pub reports: i64,
}

/// All dashboard counters in one round trip.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn dashboard(pool: &PgPool) -> Result<DashboardStats, RepositoryError> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        "SELECT
            (SELECT COUNT(*) FROM stores) AS stores,
            (SELECT COUNT(*) FROM reviews) AS reviews,
            (SELECT COUNT(*) FROM contacts WHERE status = 'pending') AS pending_contacts,
            (SELECT COUNT(*) FROM announcements WHERE is_published) AS published_announcements,
            (SELECT COUNT(*) FROM review_reports) AS reports",
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

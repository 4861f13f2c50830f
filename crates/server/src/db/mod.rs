//! Database access over the hosted `PostgreSQL` + `PostGIS` database.
//!
//! ## Tables
//!
//! - `stores`, `categories`, `store_categories` - Restaurant catalogue (written by back-office jobs)
//! - `profiles` - Nickname, avatar and role keyed by the hosted auth user id
//! - `reviews`, `review_reports` - User reviews and moderation reports
//! - `favorites` - Saved stores
//! - `announcements` - Notices managed from the admin API
//! - `contacts` - Contact form submissions
//!
//! ## RPC functions
//!
//! - `get_nearby_stores(lat, lng, radius_km)`
//! - `get_default_recommended_stores()`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p muhan-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`query_as::<_, Row>`), so the workspace
//! builds without a live database.

pub mod announcements;
pub mod contacts;
pub mod favorites;
pub mod profiles;
pub mod reports;
pub mod reviews;
pub mod stats;
pub mod stores;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to domain errors.
///
/// `conflict` describes the duplicate for the 409 message.
pub(crate) fn classify(err: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

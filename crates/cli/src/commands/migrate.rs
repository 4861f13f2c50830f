//! Database migrations.
//!
//! ```bash
//! muhan-cli migrate
//! ```
//!
//! Migrations are embedded from `crates/server/migrations/` at build time and
//! tracked in `_sqlx_migrations`, so re-running is a no-op.

use muhan_server::db;

use super::{CommandError, database_url};

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}

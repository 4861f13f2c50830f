//! Admin role management.
//!
//! ```bash
//! muhan-cli admin grant --user 6f1c...-...
//! muhan-cli admin revoke --user 6f1c...-...
//! ```
//!
//! The user id is the hosted auth user id. Granting creates the profile row
//! when the user has never edited their profile.

use muhan_core::{UserId, UserRole};
use muhan_server::db;
use uuid::Uuid;

use super::{CommandError, database_url};

/// Set a user's role.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the update fails.
pub async fn set_role(user: Uuid, role: UserRole) -> Result<(), CommandError> {
    let url = database_url()?;
    let pool = db::create_pool(&url).await?;

    let id = UserId::new(user);
    let previous = db::profiles::role(&pool, id).await?;
    let profile = db::profiles::set_role(&pool, id, role).await?;

    if previous == profile.role {
        tracing::info!(user_id = %id, role = %profile.role, "role unchanged");
    } else {
        tracing::info!(user_id = %id, from = %previous, to = %profile.role, "role updated");
    }
    Ok(())
}

//! User profiles.
//!
//! Profiles are keyed by the hosted auth user id. A row is created lazily the
//! first time a user edits their profile; the CLI creates one when granting a
//! role.

use chrono::{DateTime, Utc};
use muhan_core::{UserId, UserRole};
use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

const COLUMNS: &str = "id, nickname, avatar_url, role, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Get a profile.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: UserId) -> Result<Option<Profile>, RepositoryError> {
    let row = sqlx::query_as::<_, Profile>(&format!("SELECT {COLUMNS} FROM profiles WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// The user's role; users without a profile row are regular users.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn role(pool: &PgPool, id: UserId) -> Result<UserRole, RepositoryError> {
    let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(role.unwrap_or_default())
}

/// Set the nickname, creating the profile if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn set_nickname(
    pool: &PgPool,
    id: UserId,
    nickname: &str,
) -> Result<Profile, RepositoryError> {
    let row = sqlx::query_as::<_, Profile>(&format!(
        "INSERT INTO profiles (id, nickname) VALUES ($1, $2)
         ON CONFLICT (id) DO UPDATE SET nickname = EXCLUDED.nickname, updated_at = now()
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(nickname)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Set the avatar URL, creating the profile if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn set_avatar(
    pool: &PgPool,
    id: UserId,
    avatar_url: &str,
) -> Result<Profile, RepositoryError> {
    let row = sqlx::query_as::<_, Profile>(&format!(
        "INSERT INTO profiles (id, avatar_url) VALUES ($1, $2)
         ON CONFLICT (id) DO UPDATE SET avatar_url = EXCLUDED.avatar_url, updated_at = now()
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(avatar_url)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Set the role, creating the profile if needed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the upsert fails.
pub async fn set_role(
    pool: &PgPool,
    id: UserId,
    role: UserRole,
) -> Result<Profile, RepositoryError> {
    let row = sqlx::query_as::<_, Profile>(&format!(
        "INSERT INTO profiles (id, role) VALUES ($1, $2)
         ON CONFLICT (id) DO UPDATE SET role = EXCLUDED.role, updated_at = now()
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

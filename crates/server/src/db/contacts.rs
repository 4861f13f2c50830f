//! Contact form submissions.

use chrono::{DateTime, Utc};
use muhan_core::{ContactCategory, ContactId, ContactStatus, Email, UserId};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use super::RepositoryError;

const COLUMNS: &str = "id, user_id, name, email, category, title, message, status,
    admin_note, created_at, updated_at";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub category: ContactCategory,
    pub title: String,
    pub message: String,
    pub status: ContactStatus,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated submission.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub user_id: Option<UserId>,
    pub name: String,
    pub email: Email,
    pub category: ContactCategory,
    pub title: String,
    pub message: String,
}

/// Store a submission.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
#[instrument(skip(pool, contact), fields(category = ?contact.category))]
pub async fn create(pool: &PgPool, contact: &NewContact) -> Result<Contact, RepositoryError> {
    let row = sqlx::query_as::<_, Contact>(&format!(
        "INSERT INTO contacts (user_id, name, email, category, title, message)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(contact.user_id)
    .bind(&contact.name)
    .bind(contact.email.as_str())
    .bind(contact.category)
    .bind(&contact.title)
    .bind(&contact.message)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Submissions, newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list(
    pool: &PgPool,
    status: Option<ContactStatus>,
) -> Result<Vec<Contact>, RepositoryError> {
    let rows = sqlx::query_as::<_, Contact>(&format!(
        "SELECT {COLUMNS} FROM contacts
         WHERE $1::contact_status IS NULL OR status = $1
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(status)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Get one submission.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(pool: &PgPool, id: ContactId) -> Result<Option<Contact>, RepositoryError> {
    let row = sqlx::query_as::<_, Contact>(&format!("SELECT {COLUMNS} FROM contacts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Set status and note. Transition rules are checked by the caller.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the submission does not exist.
#[instrument(skip(pool, admin_note))]
pub async fn update_status(
    pool: &PgPool,
    id: ContactId,
    status: ContactStatus,
    admin_note: Option<&str>,
) -> Result<Contact, RepositoryError> {
    sqlx::query_as::<_, Contact>(&format!(
        "UPDATE contacts SET status = $2, admin_note = COALESCE($3, admin_note), updated_at = now()
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .bind(admin_note)
    .fetch_optional(pool)
    .await?
    .ok_or(RepositoryError::NotFound)
}

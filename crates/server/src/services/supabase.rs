//! Hosted platform client: access-token resolution and object storage.
//!
//! Sessions are issued and refreshed by the hosted auth service. This client
//! only asks it who a presented access token belongs to, and caches the
//! answer briefly so a page of parallel requests costs one round trip.

use std::time::Duration;

use moka::future::Cache;
use muhan_core::UserId;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::SupabaseConfig;

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a resolved token stays cached.
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(60);

const TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// Errors from the hosted platform.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// HTTP request failed (connect error, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Could not build a request URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl SupabaseError {
    /// Whether the failure was the outbound timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

/// The hosted auth user behind an access token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client for the hosted auth and storage APIs.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    anon_key: SecretString,
    service_role_key: SecretString,
    project_ref: Option<String>,
    users: Cache<String, AuthUser>,
}

impl SupabaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, SupabaseError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
            project_ref: config.project_ref().map(str::to_owned),
            users: Cache::builder()
                .max_capacity(TOKEN_CACHE_CAPACITY)
                .time_to_live(TOKEN_CACHE_TTL)
                .build(),
        })
    }

    /// Project reference used in session cookie names.
    #[must_use]
    pub fn project_ref(&self) -> Option<&str> {
        self.project_ref.as_deref()
    }

    /// Resolve an access token to its user.
    ///
    /// Returns `Ok(None)` when the auth service rejects the token.
    ///
    /// # Errors
    ///
    /// Returns error if the auth service cannot be reached or answers with
    /// an unexpected status.
    pub async fn user_for_token(&self, token: &str) -> Result<Option<AuthUser>, SupabaseError> {
        if let Some(user) = self.users.get(token).await {
            return Ok(Some(user));
        }

        let url = self.base_url.join("auth/v1/user")?;
        let response = self
            .http
            .get(url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::debug!(status = status.as_u16(), "access token rejected");
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: AuthUser = response.json().await?;
        self.users.insert(token.to_owned(), user.clone()).await;
        Ok(Some(user))
    }

    /// Upload an object with the service key and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns error if the upload request fails or is rejected.
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, SupabaseError> {
        let url = self
            .base_url
            .join(&format!("storage/v1/object/{bucket}/{path}"))?;
        let response = self
            .http
            .post(url)
            .header("apikey", self.service_role_key.expose_secret())
            .bearer_auth(self.service_role_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(bucket, path, "object uploaded");
        Ok(self.public_url(bucket, path))
    }

    /// Delete objects from a bucket.
    ///
    /// # Errors
    ///
    /// Returns error if the delete request fails or is rejected.
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), SupabaseError> {
        let url = self.base_url.join(&format!("storage/v1/object/{bucket}"))?;
        let response = self
            .http
            .delete(url)
            .header("apikey", self.service_role_key.expose_secret())
            .bearer_auth(self.service_role_key.expose_secret())
            .json(&serde_json::json!({ "prefixes": paths }))
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(bucket, count = paths.len(), "objects removed");
        Ok(())
    }

    /// Public URL of an object in a public bucket.
    #[must_use]
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: Url::parse("https://abcdefgh.supabase.co").unwrap(),
            anon_key: SecretString::from("anon"),
            service_role_key: SecretString::from("service"),
        })
        .unwrap()
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            client().public_url("review-images", "u1/a.png"),
            "https://abcdefgh.supabase.co/storage/v1/object/public/review-images/u1/a.png"
        );
    }

    #[test]
    fn test_project_ref() {
        assert_eq!(client().project_ref(), Some("abcdefgh"));
    }

    #[test]
    fn test_auth_user_deserialize() {
        let user: AuthUser = serde_json::from_str(
            r#"{"id":"6f1c2a8e-3b4d-4e5f-8a9b-0c1d2e3f4a5b","email":"a@b.kr","aud":"authenticated"}"#,
        )
        .unwrap();
        assert_eq!(user.email.as_deref(), Some("a@b.kr"));
    }
}

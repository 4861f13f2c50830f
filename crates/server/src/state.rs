//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::MuhanConfig;
use crate::services::geocoding::{GeocodingError, KakaoLocalClient};
use crate::services::supabase::{SupabaseClient, SupabaseError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("platform client: {0}")]
    Supabase(#[from] SupabaseError),
    #[error("geocoding client: {0}")]
    Geocoding(#[from] GeocodingError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: MuhanConfig,
    pool: PgPool,
    supabase: SupabaseClient,
    geocoder: Option<KakaoLocalClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if an outbound HTTP client cannot be built.
    pub fn new(config: MuhanConfig, pool: PgPool) -> Result<Self, StateError> {
        let supabase = SupabaseClient::new(&config.supabase)?;
        let geocoder = config
            .kakao_rest_api_key
            .as_ref()
            .map(KakaoLocalClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                supabase,
                geocoder,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &MuhanConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Hosted auth and storage client.
    #[must_use]
    pub fn supabase(&self) -> &SupabaseClient {
        &self.inner.supabase
    }

    /// Geocoding client, when `KAKAO_REST_API_KEY` is configured.
    #[must_use]
    pub fn geocoder(&self) -> Option<&KakaoLocalClient> {
        self.inner.geocoder.as_ref()
    }
}

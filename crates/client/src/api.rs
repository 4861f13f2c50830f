//! HTTP client for the Muhan JSON API.

use std::time::Duration;

use muhan_core::{ReviewId, StoreId};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ClientError;
use crate::types::{
    AddedFavorite, Favorite, FavoriteList, FavoriteRequest, FavoriteStatus, NewReview,
    ReviewSubmission, SearchEndpoint, Store, StoreList, StoreQuery, StoreReviews,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed access to the JSON API.
///
/// Requests carry the access token given to [`ApiClient::with_access_token`]
/// as a bearer token. There are no retries.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("signed_in", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the server at `base_url`, e.g. `http://localhost:3000`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(mut base_url: Url) -> Result<Self, ClientError> {
        // Joined paths are relative, so the base must end in a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url,
            access_token: None,
        })
    }

    /// Sign requests with a hosted-platform access token.
    #[must_use]
    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.access_token.is_some()
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let builder = self.http.request(method, self.url(path)?);
        Ok(match &self.access_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        if self.access_token.is_none() {
            return Err(ClientError::SignedOut);
        }
        self.request(method, path)
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "API request failed");
        Err(ClientError::from_body(status.as_u16(), &body))
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get_json<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ClientError> {
        Self::json(self.request(Method::GET, path)?.query(query)).await
    }

    /// List stores from one of the search endpoints.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` for rejected parameters (400) and
    /// `ClientError::Http` for transport failures.
    pub async fn search_stores(
        &self,
        endpoint: SearchEndpoint,
        query: &StoreQuery,
    ) -> Result<StoreList, ClientError> {
        self.get_json(endpoint.path(), query).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 for an unknown store.
    pub async fn store(&self, id: StoreId) -> Result<Store, ClientError> {
        let path = format!("api/stores/{}", id.as_i32());
        Self::json(self.request(Method::GET, &path)?).await
    }

    /// Reviews of a store with their statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn store_reviews(&self, store_id: StoreId) -> Result<StoreReviews, ClientError> {
        self.get_json("api/reviews", &[("storeId", store_id.as_i32())])
            .await
    }

    /// Create a review, or edit the caller's existing one for the store.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 429 during the creation cooldown
    /// and `ClientError::SignedOut` without an access token.
    pub async fn submit_review(&self, review: &NewReview) -> Result<ReviewSubmission, ClientError> {
        Self::json(self.authed(Method::POST, "api/reviews")?.json(review)).await
    }

    /// # Errors
    ///
    /// Returns an error unless the caller may delete the review.
    pub async fn delete_review(&self, id: ReviewId) -> Result<(), ClientError> {
        let path = format!("api/reviews/{}", id.as_i32());
        Self::check(self.authed(Method::DELETE, &path)?.send().await?).await?;
        Ok(())
    }

    /// The caller's favorites, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the caller is signed out.
    pub async fn favorites(&self) -> Result<Vec<Favorite>, ClientError> {
        let list: FavoriteList = Self::json(self.authed(Method::GET, "api/favorites")?).await?;
        Ok(list.favorites)
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 409 if already saved and 404 for
    /// an unknown store.
    pub async fn add_favorite(&self, store_id: StoreId) -> Result<AddedFavorite, ClientError> {
        Self::json(
            self.authed(Method::POST, "api/favorites")?
                .json(&FavoriteRequest { store_id }),
        )
        .await
    }

    /// Removing a store that is not saved succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the caller is signed out.
    pub async fn remove_favorite(&self, store_id: StoreId) -> Result<(), ClientError> {
        let path = format!("api/favorites/{}", store_id.as_i32());
        Self::check(self.authed(Method::DELETE, &path)?.send().await?).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the caller is signed out.
    pub async fn is_favorite(&self, store_id: StoreId) -> Result<bool, ClientError> {
        let path = format!("api/favorites/{}", store_id.as_i32());
        let status: FavoriteStatus = Self::json(self.authed(Method::GET, &path)?).await?;
        Ok(status.is_favorite)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_paths_join_under_base() {
        let c = client("https://muhan.example.kr/backend");
        assert_eq!(
            c.url(SearchEndpoint::Backup.path()).unwrap().as_str(),
            "https://muhan.example.kr/backend/api/stores/backup-filter"
        );
        let c = client("http://localhost:3000");
        assert_eq!(
            c.url("api/favorites/3").unwrap().as_str(),
            "http://localhost:3000/api/favorites/3"
        );
    }

    #[tokio::test]
    async fn test_signed_out_calls_fail_fast() {
        let c = client("http://127.0.0.1:9");
        assert!(!c.is_signed_in());
        assert!(matches!(c.favorites().await, Err(ClientError::SignedOut)));
        assert!(matches!(
            c.add_favorite(StoreId::new(1)).await,
            Err(ClientError::SignedOut)
        ));
    }

    #[test]
    fn test_debug_hides_token() {
        let c = client("http://localhost:3000")
            .with_access_token(SecretString::from("secret-token"));
        let printed = format!("{c:?}");
        assert!(!printed.contains("secret-token"));
        assert!(printed.contains("signed_in: true"));
    }
}

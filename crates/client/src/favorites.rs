//! Favorites store.
//!
//! A per-user cache of saved stores in front of a [`FavoritesApi`]. Reads
//! within the TTL of the last fetch are served locally; concurrent stale reads
//! share one fetch. Adds and removes update the cache before the request is
//! sent and are rolled back if it fails.
//!
//! ```no_run
//! # async fn demo(api: muhan_client::ApiClient, user: muhan_core::UserId) -> Result<(), muhan_client::ClientError> {
//! use muhan_client::FavoritesStore;
//! use muhan_core::StoreId;
//!
//! let store = FavoritesStore::new(api);
//! store.add(user, StoreId::new(12)).await?;
//! assert!(store.is_favorite(user, StoreId::new(12)).await?);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use muhan_core::{StoreId, UserId};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::types::{AddedFavorite, Favorite};

/// Reads within this long of the last fetch skip the network.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// The favorites endpoints, for the signed-in user.
pub trait FavoritesApi: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<Favorite>, ClientError>> + Send;

    fn add(
        &self,
        store_id: StoreId,
    ) -> impl Future<Output = Result<AddedFavorite, ClientError>> + Send;

    fn remove(&self, store_id: StoreId) -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl FavoritesApi for ApiClient {
    async fn list(&self) -> Result<Vec<Favorite>, ClientError> {
        self.favorites().await
    }

    async fn add(&self, store_id: StoreId) -> Result<AddedFavorite, ClientError> {
        self.add_favorite(store_id).await
    }

    async fn remove(&self, store_id: StoreId) -> Result<(), ClientError> {
        self.remove_favorite(store_id).await
    }
}

#[derive(Debug, Default)]
struct Cache {
    user: Option<UserId>,
    favorites: Vec<Favorite>,
    ids: HashSet<StoreId>,
    fetched_at: Option<Instant>,
}

impl Cache {
    /// Discard everything cached for another user.
    fn switch_to(&mut self, user: UserId) {
        if self.user != Some(user) {
            *self = Self {
                user: Some(user),
                ..Self::default()
            };
        }
    }

    fn is_fresh(&self, user: UserId, ttl: Duration, now: Instant) -> bool {
        self.user == Some(user)
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < ttl)
    }

    fn replace(&mut self, favorites: Vec<Favorite>, now: Instant) {
        self.ids = favorites.iter().map(|f| f.store.id).collect();
        self.favorites = favorites;
        self.fetched_at = Some(now);
    }
}

/// How to undo a local mutation that the server did not accept.
#[derive(Debug)]
enum Compensation {
    /// An optimistic add: forget the id again.
    Forget(StoreId),
    /// An optimistic remove: put the id back, and the listed entry at its
    /// old position if there was one.
    Restore {
        store_id: StoreId,
        entry: Option<(usize, Favorite)>,
    },
}

/// A change already applied to the cache, paired with its compensation.
#[derive(Debug)]
struct OptimisticChange {
    user: UserId,
    compensation: Compensation,
}

impl OptimisticChange {
    fn add(cache: &mut Cache, user: UserId, store_id: StoreId) -> Self {
        cache.ids.insert(store_id);
        Self {
            user,
            compensation: Compensation::Forget(store_id),
        }
    }

    fn remove(cache: &mut Cache, user: UserId, store_id: StoreId) -> Self {
        cache.ids.remove(&store_id);
        let entry = cache
            .favorites
            .iter()
            .position(|f| f.store.id == store_id)
            .map(|index| (index, cache.favorites.remove(index)));
        Self {
            user,
            compensation: Compensation::Restore { store_id, entry },
        }
    }

    /// Undo the change, unless the cache has since moved to another user.
    fn compensate(self, cache: &mut Cache) {
        if cache.user != Some(self.user) {
            return;
        }
        match self.compensation {
            Compensation::Forget(store_id) => {
                cache.ids.remove(&store_id);
            }
            Compensation::Restore { store_id, entry } => {
                cache.ids.insert(store_id);
                if let Some((index, favorite)) = entry
                    && !cache.favorites.iter().any(|f| f.store.id == store_id)
                {
                    let index = index.min(cache.favorites.len());
                    cache.favorites.insert(index, favorite);
                }
            }
        }
    }
}

/// Cached favorites for the signed-in user.
///
/// Owned by the caller; there is no process-wide instance. Every method takes
/// the user the API client is signed in as, and a different user than the
/// cached one starts from an empty cache.
#[derive(Debug)]
pub struct FavoritesStore<A> {
    api: A,
    ttl: Duration,
    cache: Mutex<Cache>,
    refresh: Mutex<()>,
}

impl<A: FavoritesApi> FavoritesStore<A> {
    #[must_use]
    pub fn new(api: A) -> Self {
        Self::with_ttl(api, DEFAULT_TTL)
    }

    #[must_use]
    pub fn with_ttl(api: A, ttl: Duration) -> Self {
        Self {
            api,
            ttl,
            cache: Mutex::new(Cache::default()),
            refresh: Mutex::new(()),
        }
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Fetch unless the cache is fresh. Only one fetch runs at a time; callers
    /// that waited on it reuse its result.
    async fn ensure_fresh(&self, user: UserId) -> Result<(), ClientError> {
        if self.cache.lock().await.is_fresh(user, self.ttl, Instant::now()) {
            return Ok(());
        }
        let _in_flight = self.refresh.lock().await;
        if self.cache.lock().await.is_fresh(user, self.ttl, Instant::now()) {
            return Ok(());
        }
        self.fetch(user).await
    }

    async fn fetch(&self, user: UserId) -> Result<(), ClientError> {
        let favorites = self.api.list().await?;
        tracing::debug!(count = favorites.len(), "favorites fetched");
        let mut cache = self.cache.lock().await;
        cache.switch_to(user);
        cache.replace(favorites, Instant::now());
        Ok(())
    }

    /// Refetch now, ignoring the TTL.
    ///
    /// # Errors
    ///
    /// Returns the API error; the cache is left as it was.
    pub async fn refresh(&self, user: UserId) -> Result<(), ClientError> {
        let _in_flight = self.refresh.lock().await;
        self.fetch(user).await
    }

    /// The user's favorites, newest first.
    ///
    /// # Errors
    ///
    /// Returns the API error when a fetch was needed and failed.
    pub async fn favorites(&self, user: UserId) -> Result<Vec<Favorite>, ClientError> {
        self.ensure_fresh(user).await?;
        Ok(self.cache.lock().await.favorites.clone())
    }

    /// Ids of the user's favorites, including pending optimistic adds.
    ///
    /// # Errors
    ///
    /// Returns the API error when a fetch was needed and failed.
    pub async fn ids(&self, user: UserId) -> Result<HashSet<StoreId>, ClientError> {
        self.ensure_fresh(user).await?;
        Ok(self.cache.lock().await.ids.clone())
    }

    /// # Errors
    ///
    /// Returns the API error when a fetch was needed and failed.
    pub async fn is_favorite(&self, user: UserId, store_id: StoreId) -> Result<bool, ClientError> {
        self.ensure_fresh(user).await?;
        Ok(self.cache.lock().await.ids.contains(&store_id))
    }

    /// Save a store. Returns `false` if it was already saved.
    ///
    /// The id is visible immediately. A 409 from the server means it was
    /// already saved and keeps it; any other failure forgets it again. The
    /// listing is refetched on the next read.
    ///
    /// # Errors
    ///
    /// Returns the API error (other than 409) after rolling back.
    pub async fn add(&self, user: UserId, store_id: StoreId) -> Result<bool, ClientError> {
        self.ensure_fresh(user).await?;
        let change = {
            let mut cache = self.cache.lock().await;
            if cache.ids.contains(&store_id) {
                return Ok(false);
            }
            OptimisticChange::add(&mut cache, user, store_id)
        };

        match self.api.add(store_id).await {
            Ok(added) => {
                tracing::debug!(favorite_id = added.id.as_i32(), "favorite added");
                self.cache.lock().await.fetched_at = None;
                Ok(true)
            }
            Err(e) if e.is_conflict() => Ok(false),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    store_id = store_id.as_i32(),
                    "favorite add failed; rolling back"
                );
                change.compensate(&mut *self.cache.lock().await);
                Err(e)
            }
        }
    }

    /// Unsave a store. Removing a store that is not saved still asks the
    /// server, which treats it as success.
    ///
    /// # Errors
    ///
    /// Returns the API error after restoring the removed entry.
    pub async fn remove(&self, user: UserId, store_id: StoreId) -> Result<(), ClientError> {
        self.ensure_fresh(user).await?;
        let change = {
            let mut cache = self.cache.lock().await;
            OptimisticChange::remove(&mut cache, user, store_id)
        };

        if let Err(e) = self.api.remove(store_id).await {
            tracing::warn!(
                error = %e,
                store_id = store_id.as_i32(),
                "favorite remove failed; rolling back"
            );
            change.compensate(&mut *self.cache.lock().await);
            return Err(e);
        }
        Ok(())
    }

    /// Flip the saved state and return the new one.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying add or remove.
    pub async fn toggle(&self, user: UserId, store_id: StoreId) -> Result<bool, ClientError> {
        if self.is_favorite(user, store_id).await? {
            self.remove(user, store_id).await?;
            Ok(false)
        } else {
            self.add(user, store_id).await?;
            Ok(true)
        }
    }

    /// Drop everything cached, e.g. on sign-out.
    pub async fn clear(&self) {
        *self.cache.lock().await = Cache::default();
    }
}

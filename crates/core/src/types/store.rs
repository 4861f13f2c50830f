//! The store entity as the ranking layer sees it.

use serde::Serialize;

use super::category::CategorySet;
use super::geo::{Coordinates, LegacyPosition};
use super::id::StoreId;
use super::rating::ExternalRatings;

/// A restaurant with its categories already normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub position: Option<Coordinates>,
    pub legacy_position: Option<LegacyPosition>,
    pub categories: CategorySet,
    pub ratings: ExternalRatings,
    pub description: Option<String>,
    pub open_hours: Option<String>,
    pub price: Option<String>,
    pub image_urls: Vec<String>,
}

impl Store {
    /// Case-insensitive substring match on name or address.
    #[must_use]
    pub fn matches_text(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.address.to_lowercase().contains(&needle)
    }
}

/// A store paired with its distance from the search origin, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStore {
    pub store: Store,
    pub distance_km: Option<f64>,
}

impl RankedStore {
    #[must_use]
    pub const fn new(store: Store, distance_km: Option<f64>) -> Self {
        Self { store, distance_km }
    }

    #[must_use]
    pub const fn unranked(store: Store) -> Self {
        Self {
            store,
            distance_km: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal store for tests.
    pub fn store(id: i32, name: &str, naver: Option<f64>, kakao: Option<f64>) -> Store {
        Store {
            id: StoreId::new(id),
            name: name.to_owned(),
            address: format!("서울 중구 세종대로 {id}"),
            position: None,
            legacy_position: None,
            categories: CategorySet::default(),
            ratings: ExternalRatings::new(naver, kakao),
            description: None,
            open_hours: None,
            price: None,
            image_urls: Vec::new(),
        }
    }
}

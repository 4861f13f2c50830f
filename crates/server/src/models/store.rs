//! Store response view.

use std::collections::HashMap;

use muhan_core::search::{Page, PageInfo};
use muhan_core::{RankedStore, RatingBasis, ReviewStats, StoreId};
use serde::Serialize;

/// One store as returned by the listing and detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub categories: Vec<String>,
    pub naver_rating: Option<f64>,
    pub kakao_rating: Option<f64>,
    /// The two external ratings combined the way the endpoint filtered on
    /// them: the better one, or their mean on the fallback search.
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub open_hours: Option<String>,
    pub price: Option<String>,
    pub image_urls: Vec<String>,
    /// Kilometres from the search origin, two decimals.
    pub distance: Option<f64>,
    /// Mean of user reviews, one decimal; 0 without reviews.
    pub average_rating: f64,
    pub review_count: u32,
}

fn round_to_hundredth(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl StoreResponse {
    #[must_use]
    pub fn new(ranked: RankedStore, stats: ReviewStats) -> Self {
        Self::with_basis(ranked, stats, RatingBasis::Max)
    }

    /// Like [`StoreResponse::new`], with `rating` combined by `basis`.
    #[must_use]
    pub fn with_basis(ranked: RankedStore, stats: ReviewStats, basis: RatingBasis) -> Self {
        let RankedStore { store, distance_km } = ranked;
        let rating = store.ratings.score(basis).map(round_to_hundredth);
        Self {
            id: store.id,
            name: store.name,
            address: store.address,
            latitude: store.position.map(|p| p.latitude()),
            longitude: store.position.map(|p| p.longitude()),
            position_x: store.legacy_position.map(|p| p.x),
            position_y: store.legacy_position.map(|p| p.y),
            categories: store.categories.names().to_vec(),
            naver_rating: store.ratings.naver,
            kakao_rating: store.ratings.kakao,
            rating,
            description: store.description,
            open_hours: store.open_hours,
            price: store.price,
            image_urls: store.image_urls,
            distance: distance_km.map(round_to_hundredth),
            average_rating: stats.average_rating,
            review_count: stats.review_count,
        }
    }
}

/// `{ stores, pagination }` body of the search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreListResponse {
    pub stores: Vec<StoreResponse>,
    pub pagination: PageInfo,
}

impl StoreListResponse {
    /// Combine a page of stores with their review statistics.
    ///
    /// Stores missing from `stats` have no reviews.
    #[must_use]
    pub fn from_page(
        page: Page<RankedStore>,
        stats: &HashMap<StoreId, ReviewStats>,
        basis: RatingBasis,
    ) -> Self {
        let stores = page
            .items
            .into_iter()
            .map(|ranked| {
                let s = stats.get(&ranked.store.id).copied().unwrap_or_default();
                StoreResponse::with_basis(ranked, s, basis)
            })
            .collect();
        Self {
            stores,
            pagination: page.info,
        }
    }
}

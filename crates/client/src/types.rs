//! Request and response shapes of the JSON API.

use chrono::{DateTime, Utc};
use muhan_core::search::PageInfo;
use muhan_core::{FavoriteId, ReviewId, ReviewStats, StoreId, SubRatings, UserId};
use serde::{Deserialize, Serialize};

/// A store as listed by the search endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub naver_rating: Option<f64>,
    pub kakao_rating: Option<f64>,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub open_hours: Option<String>,
    pub price: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Kilometres from the search origin.
    pub distance: Option<f64>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub review_count: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreList {
    pub stores: Vec<Store>,
    pub pagination: PageInfo,
}

/// Which listing endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchEndpoint {
    /// `/api/stores`
    #[default]
    Nearby,
    /// `/api/stores/filter`
    Filter,
    /// `/api/stores/backup-filter`
    Backup,
}

impl SearchEndpoint {
    pub(crate) const fn path(self) -> &'static str {
        match self {
            Self::Nearby => "api/stores",
            Self::Filter => "api/stores/filter",
            Self::Backup => "api/stores/backup-filter",
        }
    }
}

/// Query string for the listing endpoints. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    /// Comma-separated category names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl StoreQuery {
    /// Search around a point.
    #[must_use]
    pub fn near(lat: f64, lng: f64) -> Self {
        Self {
            lat: Some(lat),
            lng: Some(lng),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_owned())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.categories = (!joined.is_empty()).then_some(joined);
        self
    }
}

/// A saved store, newest first in listings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: FavoriteId,
    pub created_at: DateTime<Utc>,
    pub store: Store,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FavoriteList {
    pub favorites: Vec<Favorite>,
}

/// Answer to `POST /api/favorites`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedFavorite {
    pub id: FavoriteId,
    pub store_id: StoreId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FavoriteStatus {
    pub is_favorite: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FavoriteRequest {
    pub store_id: StoreId,
}

/// A review as stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub rating: i16,
    pub content: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present on store listings.
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoreReviews {
    pub reviews: Vec<Review>,
    pub statistics: ReviewStats,
}

/// Body of `POST /api/reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub store_id: StoreId,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "SubRatings::is_empty")]
    pub sub_ratings: SubRatings,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Answer to `POST /api/reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewSubmission {
    pub review: Review,
    /// An earlier review for the same store was edited instead of creating one.
    pub updated: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_store_query_omits_unset_fields() {
        let query = StoreQuery::near(37.5, 127.0).with_categories(["고기", " ", "해산물"]);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({"lat": 37.5, "lng": 127.0, "categories": "고기,해산물"})
        );

        let none = StoreQuery::default().with_categories(Vec::<String>::new());
        assert_eq!(serde_json::to_value(&none).unwrap(), json!({}));
    }

    #[test]
    fn test_store_list_decodes_server_shape() {
        let list: StoreList = serde_json::from_value(json!({
            "stores": [{
                "id": 7,
                "name": "무한고기",
                "address": "서울 중구",
                "latitude": 37.56,
                "longitude": 126.97,
                "positionX": null,
                "positionY": null,
                "categories": ["고기"],
                "naverRating": 4.4,
                "kakaoRating": null,
                "rating": 4.4,
                "description": null,
                "openHours": null,
                "price": "19,900원",
                "imageUrls": [],
                "distance": 1.25,
                "averageRating": 4.5,
                "reviewCount": 2
            }],
            "pagination": {"page": 1, "limit": 20, "total": 1, "hasMore": false}
        }))
        .unwrap();
        assert_eq!(list.stores.len(), 1);
        assert_eq!(list.stores.first().unwrap().id, StoreId::new(7));
        assert!(!list.pagination.has_more);
    }

    #[test]
    fn test_new_review_skips_empty_parts() {
        let review = NewReview {
            store_id: StoreId::new(3),
            rating: 5,
            content: None,
            images: vec![],
            sub_ratings: SubRatings::default(),
            tags: vec![],
        };
        assert_eq!(
            serde_json::to_value(&review).unwrap(),
            json!({"storeId": 3, "rating": 5})
        );
    }
}

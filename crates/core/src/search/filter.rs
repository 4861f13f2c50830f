//! Store filtering and ordering.

use std::cmp::Ordering;

use crate::types::{Coordinates, RankedStore, RatingBasis, Store};

/// Default search radius when the caller gives coordinates but no radius.
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Largest radius the search endpoints accept. Larger values are clamped.
pub const MAX_RADIUS_KM: f64 = 50.0;

/// How many default recommendations are returned when no location is given.
pub const DEFAULT_RECOMMENDATION_CAP: usize = 50;

/// How [`backup_filter`] combines the two external ratings.
pub const BACKUP_RATING_BASIS: RatingBasis = RatingBasis::Mean;

/// Criteria applied after candidates have been fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreFilter {
    pub min_rating: Option<f64>,
    pub rating_basis: RatingBasis,
    /// Any one of these must be present. Empty matches everything.
    pub categories: Vec<String>,
    pub query: Option<String>,
    /// Only consulted by the in-memory fallback; the RPC path already limits
    /// by radius.
    pub max_distance_km: Option<f64>,
}

impl StoreFilter {
    fn within_distance(&self, ranked: &RankedStore) -> bool {
        match (self.max_distance_km, ranked.distance_km) {
            (None, _) => true,
            (Some(max), Some(d)) => d <= max,
            (Some(_), None) => false,
        }
    }

    fn has_category(&self, store: &Store) -> bool {
        store.categories.contains_any(&self.categories)
    }

    fn meets_rating(&self, store: &Store) -> bool {
        self.min_rating
            .is_none_or(|min| store.ratings.meets(min, self.rating_basis))
    }

    fn matches_query(&self, store: &Store) -> bool {
        self.query.as_deref().is_none_or(|q| store.matches_text(q))
    }

    /// Whether one candidate passes every criterion.
    #[must_use]
    pub fn matches(&self, ranked: &RankedStore) -> bool {
        self.within_distance(ranked)
            && self.has_category(&ranked.store)
            && self.meets_rating(&ranked.store)
            && self.matches_query(&ranked.store)
    }

    /// Keep only matching candidates, preserving their order.
    #[must_use]
    pub fn apply(&self, candidates: Vec<RankedStore>) -> Vec<RankedStore> {
        candidates.into_iter().filter(|c| self.matches(c)).collect()
    }
}

/// Requested result order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Nearest first; stores without a distance go last.
    Distance,
    /// Highest combined rating first; unrated stores go last.
    Rating,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "distance" => Ok(Self::Distance),
            "rating" => Ok(Self::Rating),
            other => Err(format!("invalid sort order: {other}")),
        }
    }
}

fn cmp_missing_last(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.total_cmp(&a),
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable in-place sort.
pub fn sort_stores(stores: &mut [RankedStore], order: SortOrder, basis: RatingBasis) {
    match order {
        SortOrder::Distance => {
            stores.sort_by(|a, b| cmp_missing_last(a.distance_km, b.distance_km, false));
        }
        SortOrder::Rating => stores.sort_by(|a, b| {
            cmp_missing_last(
                a.store.ratings.score(basis),
                b.store.ratings.score(basis),
                true,
            )
        }),
    }
}

/// Clamp a requested radius into `(0, MAX_RADIUS_KM]`, defaulting when absent.
///
/// Returns `None` for zero, negative or non-finite radii.
#[must_use]
pub fn effective_radius_km(requested: Option<f64>) -> Option<f64> {
    match requested {
        None => Some(DEFAULT_RADIUS_KM),
        Some(r) if r.is_finite() && r > 0.0 => Some(r.min(MAX_RADIUS_KM)),
        Some(_) => None,
    }
}

/// Candidates already ranked by the geospatial RPC (distance ascending).
///
/// The RPC has applied the radius, so only the remaining criteria run.
#[must_use]
pub fn rank_nearby(candidates: Vec<RankedStore>, filter: &StoreFilter) -> Vec<RankedStore> {
    let filter = StoreFilter {
        max_distance_km: None,
        ..filter.clone()
    };
    filter.apply(candidates)
}

/// Default recommendations for callers without a location.
#[must_use]
pub fn rank_default(candidates: Vec<RankedStore>, filter: &StoreFilter) -> Vec<RankedStore> {
    let mut out = filter.apply(candidates);
    out.truncate(DEFAULT_RECOMMENDATION_CAP);
    out
}

/// In-memory search over the full store list, used when the geospatial RPC
/// is unavailable.
///
/// Distances are computed with haversine from `origin` and attached to every
/// result. Filters run in order: distance, category, rating, text. Ratings use
/// the mean of the present sources regardless of `filter.rating_basis`.
#[must_use]
pub fn backup_filter(
    stores: Vec<Store>,
    origin: Option<Coordinates>,
    filter: &StoreFilter,
    sort: Option<SortOrder>,
) -> Vec<RankedStore> {
    let filter = StoreFilter {
        rating_basis: BACKUP_RATING_BASIS,
        ..filter.clone()
    };

    let mut ranked: Vec<RankedStore> = stores
        .into_iter()
        .map(|store| {
            let distance = origin
                .zip(store.position)
                .map(|(o, p)| o.distance_km(&p));
            RankedStore::new(store, distance)
        })
        .collect();

    if origin.is_some() {
        ranked.retain(|r| filter.within_distance(r));
    }
    ranked.retain(|r| filter.has_category(&r.store));
    ranked.retain(|r| filter.meets_rating(&r.store));
    ranked.retain(|r| filter.matches_query(&r.store));

    if let Some(order) = sort {
        sort_stores(&mut ranked, order, filter.rating_basis);
    }
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CategorySet;
    use crate::types::store::fixtures::store;

    fn ranked(
        id: i32,
        distance: Option<f64>,
        naver: Option<f64>,
        kakao: Option<f64>,
    ) -> RankedStore {
        RankedStore::new(store(id, &format!("store {id}"), naver, kakao), distance)
    }

    fn ids(stores: &[RankedStore]) -> Vec<i32> {
        stores.iter().map(|r| r.store.id.as_i32()).collect()
    }

    #[test]
    fn test_min_rating_uses_max_basis() {
        let filter = StoreFilter {
            min_rating: Some(4.0),
            ..StoreFilter::default()
        };
        let out = rank_nearby(
            vec![
                ranked(1, Some(0.5), Some(3.0), Some(4.1)),
                ranked(2, Some(1.0), Some(3.9), None),
                ranked(3, Some(2.0), None, None),
            ],
            &filter,
        );
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn test_category_and_text_filters() {
        let mut a = ranked(1, None, None, None);
        a.store.categories = CategorySet::from_names(["고기"]);
        let mut b = ranked(2, None, None, None);
        b.store.categories = CategorySet::from_names(["초밥"]);
        b.store.name = "스시 뷔페".to_owned();

        let by_category = StoreFilter {
            categories: vec!["초밥".to_owned(), "해산물".to_owned()],
            ..StoreFilter::default()
        };
        assert_eq!(ids(&by_category.apply(vec![a.clone(), b.clone()])), vec![2]);

        let by_text = StoreFilter {
            query: Some("뷔페".to_owned()),
            ..StoreFilter::default()
        };
        assert_eq!(ids(&by_text.apply(vec![a, b])), vec![2]);
    }

    #[test]
    fn test_sort_by_distance_puts_missing_last() {
        let mut stores = vec![
            ranked(1, None, None, None),
            ranked(2, Some(3.2), None, None),
            ranked(3, Some(0.4), None, None),
        ];
        sort_stores(&mut stores, SortOrder::Distance, RatingBasis::Max);
        assert_eq!(ids(&stores), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_by_rating_descending() {
        let mut stores = vec![
            ranked(1, None, Some(3.0), None),
            ranked(2, None, None, None),
            ranked(3, None, Some(4.0), Some(4.8)),
            ranked(4, None, Some(4.5), None),
        ];
        sort_stores(&mut stores, SortOrder::Rating, RatingBasis::Max);
        assert_eq!(ids(&stores), vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("distance".parse::<SortOrder>().unwrap(), SortOrder::Distance);
        assert_eq!("rating".parse::<SortOrder>().unwrap(), SortOrder::Rating);
        assert!("name".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_effective_radius() {
        assert_eq!(effective_radius_km(None), Some(DEFAULT_RADIUS_KM));
        assert_eq!(effective_radius_km(Some(2.5)), Some(2.5));
        assert_eq!(effective_radius_km(Some(500.0)), Some(MAX_RADIUS_KM));
        assert_eq!(effective_radius_km(Some(0.0)), None);
        assert_eq!(effective_radius_km(Some(f64::NAN)), None);
    }

    #[test]
    fn test_default_ranking_is_capped() {
        let many = (0..80).map(|i| ranked(i, None, None, None)).collect();
        assert_eq!(
            rank_default(many, &StoreFilter::default()).len(),
            DEFAULT_RECOMMENDATION_CAP
        );
    }

    #[test]
    fn test_backup_filter_uses_mean_and_haversine() {
        let origin = Coordinates::new(37.5, 127.0).unwrap();

        let mut near = store(1, "near", Some(3.5), Some(4.5));
        near.position = Some(Coordinates::new(37.51, 127.0).unwrap());
        let mut far = store(2, "far", Some(5.0), Some(5.0));
        far.position = Some(Coordinates::new(37.9, 127.0).unwrap());
        let mut below_mean = store(3, "below", Some(3.0), Some(4.8));
        below_mean.position = Some(Coordinates::new(37.501, 127.0).unwrap());
        let nowhere = store(4, "nowhere", Some(5.0), None);

        let filter = StoreFilter {
            min_rating: Some(4.0),
            rating_basis: RatingBasis::Max,
            max_distance_km: Some(5.0),
            ..StoreFilter::default()
        };
        let out = backup_filter(
            vec![near, far, below_mean, nowhere],
            Some(origin),
            &filter,
            Some(SortOrder::Distance),
        );

        assert_eq!(ids(&out), vec![1]);
        let d = out[0].distance_km.unwrap();
        assert!((d - 1.11).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_backup_filter_without_origin_ignores_distance() {
        let filter = StoreFilter {
            max_distance_km: Some(1.0),
            ..StoreFilter::default()
        };
        let out = backup_filter(vec![store(1, "a", None, None)], None, &filter, None);
        assert_eq!(ids(&out), vec![1]);
        assert_eq!(out[0].distance_km, None);
    }
}

//! Store search from query string to ranked page.

#![allow(clippy::unwrap_used)]

use axum::extract::Query;
use axum::http::Uri;
use muhan_core::search::{SortOrder, backup_filter, paginate, rank_default, rank_nearby};
use muhan_core::{RankedStore, RatingBasis};
use muhan_integration_tests::{nearby_rpc, seoul_stores};
use muhan_server::services::store_search::{SearchRequest, StoreSearchParams};

fn request(query: &str) -> SearchRequest {
    let uri: Uri = format!("/api/stores?{query}").parse().unwrap();
    let Query(params) = Query::<StoreSearchParams>::try_from_uri(&uri).unwrap();
    SearchRequest::from_params(params).unwrap()
}

fn ids(stores: &[RankedStore]) -> Vec<i32> {
    stores.iter().map(|r| r.store.id.as_i32()).collect()
}

#[test]
fn test_nearby_with_min_rating_keeps_close_rated_stores() {
    let req = request("lat=37.5&lng=127.0&radius=5&minRating=4");
    let origin = req.origin.unwrap();

    let candidates = nearby_rpc(seoul_stores(), origin, req.radius_km);
    let ranked = rank_nearby(candidates, &req.filter);

    assert_eq!(ids(&ranked), vec![1, 2]);
    for r in &ranked {
        assert!(r.distance_km.unwrap() <= 5.0);
        assert!(r.store.ratings.score(RatingBasis::Max).unwrap() >= 4.0);
    }
    assert!(
        ranked
            .windows(2)
            .all(|w| w[0].distance_km <= w[1].distance_km)
    );
}

#[test]
fn test_radius_is_ignored_by_ranking_after_rpc() {
    // The RPC already cut by radius; a radius given as a query parameter must
    // not drop candidates the RPC returned.
    let req = request("lat=37.5&lng=127.0&radius=1");
    let candidates = nearby_rpc(seoul_stores(), req.origin.unwrap(), 10.0);
    let ranked = rank_nearby(candidates, &req.filter);
    assert_eq!(ids(&ranked), vec![5, 1, 2, 3, 4]);
}

#[test]
fn test_backup_filter_uses_mean_rating_and_distance_sort() {
    let req = request("lat=37.5&lng=127.0&minRating=4&maxDistance=10&sort=distance");
    let ranked = backup_filter(seoul_stores(), req.origin, &req.filter, req.sort);

    assert_eq!(ids(&ranked), vec![1, 3, 4]);
    assert!(
        ranked
            .windows(2)
            .all(|w| w[0].distance_km.unwrap() <= w[1].distance_km.unwrap())
    );
}

#[test]
fn test_backup_filter_by_category_and_rating_sort() {
    let req = request("categories=%ED%95%B4%EC%82%B0%EB%AC%BC&sort=rating");
    assert_eq!(req.sort, Some(SortOrder::Rating));

    let ranked = backup_filter(seoul_stores(), req.origin, &req.filter, req.sort);
    assert_eq!(ids(&ranked), vec![3, 2]);
    assert!(ranked.iter().all(|r| r.distance_km.is_none()));
}

#[test]
fn test_text_query_matches_name() {
    let req = request("q=%EA%B3%A0%EA%B8%B0");
    let ranked = backup_filter(seoul_stores(), None, &req.filter, None);
    assert_eq!(ids(&ranked), vec![1]);
}

#[test]
fn test_default_recommendations_are_paginated() {
    let req = request("limit=2&page=2");
    let all: Vec<RankedStore> = seoul_stores()
        .into_iter()
        .map(RankedStore::unranked)
        .collect();
    let page = paginate(rank_default(all, &req.filter), req.pagination);

    assert_eq!(ids(&page.items), vec![3, 4]);
    assert_eq!(page.info.total, 6);
    assert!(page.info.has_more);

    let last = paginate(
        rank_default(
            seoul_stores().into_iter().map(RankedStore::unranked).collect(),
            &req.filter,
        ),
        request("limit=2&page=3").pagination,
    );
    assert!(!last.info.has_more);
}

//! Status codes and error bodies through the full router.
//!
//! Every request here is rejected before a database call, so the lazily
//! connected pool is never used.

#![allow(clippy::unwrap_used)]

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use muhan_integration_tests::test_app;
use serde_json::Value;
use tower::ServiceExt;

async fn send(request: Request<Body>) -> Response {
    test_app().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "198.51.100.7")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

async fn error_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_error_body_shape() {
    let response = send(get("/api/stores?lat=37.5&lng=300")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = error_body(response).await;
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(!body["error"]["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_negative_radius_rejected() {
    let response = send(get("/api/stores?lat=37.5&lng=127&radius=-1")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_min_rating_out_of_range_rejected() {
    let response = send(get("/api/stores/backup-filter?minRating=7")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reviews_require_numeric_store_id() {
    let response = send(get("/api/reviews?storeId=abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signed_in_routes_require_token() {
    for uri in ["/api/reviews/me", "/api/favorites", "/api/favorites/3", "/api/profile"] {
        let response = send(get(uri)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(error_body(response).await["error"]["code"], "unauthorized");
    }
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let response = send(json(
        Method::POST,
        "/api/admin/announcements",
        r#"{"title":"공지","content":"내용"}"#,
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(json(
        Method::PATCH,
        "/api/admin/contacts/1",
        r#"{"status":"completed"}"#,
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_report_requires_token() {
    let response = send(json(
        Method::POST,
        "/api/reviews/5/report",
        r#"{"reason":"광고"}"#,
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_contact_requires_fields() {
    let response = send(json(
        Method::POST,
        "/api/contact",
        r#"{"name":"","email":"a@b.co","title":"제목","message":"내용"}"#,
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_places_search_unconfigured() {
    let response = send(get("/api/places/search?query=%EB%AC%B4%ED%95%9C")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = send(request).await;
    assert_eq!(response.headers()["x-request-id"], "trace-abc-123");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = send(get("/api/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

//! Review routes.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    handler::Handler,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use muhan_core::types::review::MAX_REVIEW_IMAGES;
use muhan_core::{ReviewId, ReviewStats, StoreId, UserReviewStatistics};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db;
use crate::db::reports::ReviewReport;
use crate::db::reviews::{Review, ReviewWithAuthor, ReviewWithStore};
use crate::error::{AppError, Result};
use crate::middleware::{RequireUser, report_rate_limiter, review_rate_limiter};
use crate::models::{ReportBody, ReviewBody};
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::reviews::{self as review_service, Submission};
use crate::services::uploads::{self, MAX_IMAGE_BYTES, REVIEW_IMAGES_BUCKET};
use crate::state::AppState;

/// Room for five full-size images plus multipart framing.
const IMAGE_UPLOAD_BODY_LIMIT: usize = MAX_REVIEW_IMAGES * MAX_IMAGE_BYTES + 64 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reviews",
            get(list_for_store).post(submit.layer(review_rate_limiter())),
        )
        .route("/reviews/me", get(mine))
        .route(
            "/reviews/images",
            post(upload_images.layer(review_rate_limiter()))
                .layer(DefaultBodyLimit::max(IMAGE_UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/reviews/{id}",
            get(show).put(update).delete(delete_review),
        )
        .route(
            "/reviews/{id}/report",
            post(report.layer(report_rate_limiter())),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreReviewsQuery {
    store_id: StoreId,
}

#[derive(Serialize)]
struct StoreReviewsResponse {
    reviews: Vec<ReviewWithAuthor>,
    statistics: ReviewStats,
}

/// `GET /api/reviews?storeId=`
#[instrument(skip(state))]
async fn list_for_store(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StoreReviewsQuery>,
) -> Result<Json<StoreReviewsResponse>> {
    let reviews = db::reviews::list_for_store(state.pool(), query.store_id).await?;
    let statistics = review_service::store_stats(reviews.iter().map(|r| &r.review));
    Ok(Json(StoreReviewsResponse {
        reviews,
        statistics,
    }))
}

#[derive(Serialize)]
struct SubmitResponse {
    review: Review,
    updated: bool,
}

/// `POST /api/reviews`
///
/// 201 for a new review, 200 when the caller's existing review for the store
/// was edited instead.
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<ReviewBody>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    let store_id = body
        .store_id
        .ok_or_else(|| AppError::BadRequest("가게를 선택해주세요.".to_owned()))?;
    let input = body.into_input()?;

    let submission = review_service::submit(
        state.pool(),
        state.config().cooldown_scope,
        user.id,
        store_id,
        &input,
        Utc::now(),
    )
    .await?;

    let status = if submission.created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let updated = !submission.created();
    let (Submission::Created(review) | Submission::Updated(review)) = submission;
    Ok((status, Json(SubmitResponse { review, updated })))
}

#[derive(Serialize)]
struct MyReviewsResponse {
    reviews: Vec<ReviewWithStore>,
    statistics: UserReviewStatistics,
}

/// `GET /api/reviews/me`
async fn mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<MyReviewsResponse>> {
    let reviews = db::reviews::list_for_user(state.pool(), user.id).await?;
    let statistics = review_service::user_stats(reviews.iter().map(|r| &r.review));
    Ok(Json(MyReviewsResponse {
        reviews,
        statistics,
    }))
}

/// `GET /api/reviews/{id}`
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<Json<Review>> {
    Ok(Json(review_service::require(state.pool(), id).await?))
}

/// `PUT /api/reviews/{id}`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ReviewId>,
    ApiJson(body): ApiJson<ReviewBody>,
) -> Result<Json<Review>> {
    let existing = review_service::require(state.pool(), id).await?;
    review_service::ensure_can_edit(&existing, user.id)?;
    let input = body.into_input()?;
    Ok(Json(db::reviews::update(state.pool(), id, &input).await?))
}

/// `DELETE /api/reviews/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
async fn delete_review(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ReviewId>,
) -> Result<StatusCode> {
    let existing = review_service::require(state.pool(), id).await?;
    let is_admin = existing.user_id != user.id
        && db::profiles::role(state.pool(), user.id).await?.is_admin();
    review_service::ensure_can_delete(&existing, user.id, is_admin)?;
    db::reviews::delete(state.pool(), id).await?;
    tracing::info!(review_id = %id, by_admin = is_admin, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/reviews/{id}/report`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn report(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<ReviewId>,
    ApiJson(body): ApiJson<ReportBody>,
) -> Result<(StatusCode, Json<ReviewReport>)> {
    let reason = body.validate()?;
    let review = review_service::require(state.pool(), id).await?;
    review_service::ensure_can_report(&review, user.id)?;
    let report = db::reports::create(state.pool(), id, user.id, &reason)
        .await
        .map_err(|e| match e {
            db::RepositoryError::Conflict(_) => {
                AppError::Conflict("이미 신고한 리뷰입니다.".to_owned())
            }
            other => other.into(),
        })?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Serialize)]
struct UploadResponse {
    urls: Vec<String>,
}

/// `POST /api/reviews/images` (multipart, up to five images)
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
async fn upload_images(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let files = uploads::read_images(&mut multipart, MAX_REVIEW_IMAGES).await?;
    let urls =
        uploads::store_images(state.supabase(), REVIEW_IMAGES_BUCKET, user.id, files).await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { urls })))
}

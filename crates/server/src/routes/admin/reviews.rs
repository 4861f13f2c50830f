//! Review moderation.

use axum::{Json, extract::State};
use muhan_core::search::PageInfo;
use serde::Serialize;

use crate::db;
use crate::db::reports::ReportWithReview;
use crate::db::reviews::ReviewWithAuthor;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::routes::extract::{ApiQuery, PageQuery};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ReviewPage {
    reviews: Vec<ReviewWithAuthor>,
    pagination: PageInfo,
}

/// `GET /api/admin/reviews`, newest first.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<ReviewPage>> {
    let pagination = query.pagination();
    let (reviews, total) = db::reviews::list_recent(state.pool(), pagination).await?;
    Ok(Json(ReviewPage {
        reviews,
        pagination: pagination.info(total),
    }))
}

#[derive(Serialize)]
pub struct ReportList {
    reports: Vec<ReportWithReview>,
}

/// `GET /api/admin/reports`, newest first.
pub async fn reports(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<ReportList>> {
    let reports = db::reports::list(state.pool()).await?;
    Ok(Json(ReportList { reports }))
}

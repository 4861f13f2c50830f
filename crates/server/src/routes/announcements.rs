//! Public announcement routes.

use axum::{Json, Router, extract::State, routing::get};
use muhan_core::AnnouncementId;
use muhan_core::search::PageInfo;
use serde::Serialize;

use crate::db;
use crate::db::announcements::Announcement;
use crate::error::{AppError, Result};
use crate::routes::extract::{ApiPath, ApiQuery, PageQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/announcements", get(list))
        .route("/announcements/{id}", get(show))
}

#[derive(Serialize)]
pub struct AnnouncementList {
    pub announcements: Vec<Announcement>,
    pub pagination: PageInfo,
}

/// `GET /api/announcements`: published only, newest first.
async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<AnnouncementList>> {
    let pagination = query.pagination();
    let (announcements, total) =
        db::announcements::list_published(state.pool(), pagination).await?;
    Ok(Json(AnnouncementList {
        announcements,
        pagination: pagination.info(total),
    }))
}

/// `GET /api/announcements/{id}`: drafts are hidden.
async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AnnouncementId>,
) -> Result<Json<Announcement>> {
    db::announcements::get(state.pool(), id)
        .await?
        .filter(|a| a.is_published)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("공지사항을 찾을 수 없습니다.".to_owned()))
}

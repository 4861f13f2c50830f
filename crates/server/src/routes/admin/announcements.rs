//! Announcement management.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use muhan_core::AnnouncementId;
use tracing::instrument;

use crate::db;
use crate::db::announcements::Announcement;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::AnnouncementBody;
use crate::routes::announcements::AnnouncementList;
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery, PageQuery};
use crate::state::AppState;

/// `GET /api/admin/announcements`: drafts included.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<AnnouncementList>> {
    let pagination = query.pagination();
    let (announcements, total) = db::announcements::list_all(state.pool(), pagination).await?;
    Ok(Json(AnnouncementList {
        announcements,
        pagination: pagination.info(total),
    }))
}

/// `GET /api/admin/announcements/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiPath(id): ApiPath<AnnouncementId>,
) -> Result<Json<Announcement>> {
    db::announcements::get(state.pool(), id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("공지사항을 찾을 수 없습니다.".to_owned()))
}

/// `POST /api/admin/announcements`
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(body): ApiJson<AnnouncementBody>,
) -> Result<(StatusCode, Json<Announcement>)> {
    let input = body.into_input()?;
    let announcement = db::announcements::create(state.pool(), admin, &input, Utc::now()).await?;
    tracing::info!(
        announcement_id = %announcement.id,
        published = announcement.is_published,
        "announcement created"
    );
    Ok((StatusCode::CREATED, Json(announcement)))
}

/// `PUT /api/admin/announcements/{id}`
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<AnnouncementId>,
    ApiJson(body): ApiJson<AnnouncementBody>,
) -> Result<Json<Announcement>> {
    let input = body.into_input()?;
    let announcement = db::announcements::update(state.pool(), id, &input, Utc::now()).await?;
    tracing::info!(published = announcement.is_published, "announcement updated");
    Ok(Json(announcement))
}

/// `DELETE /api/admin/announcements/{id}`
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<AnnouncementId>,
) -> Result<StatusCode> {
    db::announcements::delete(state.pool(), id).await?;
    tracing::info!("announcement deleted");
    Ok(StatusCode::NO_CONTENT)
}

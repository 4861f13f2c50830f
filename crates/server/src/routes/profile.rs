//! The caller's profile.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
};
use muhan_core::{UserId, UserRole};
use serde::Serialize;
use tracing::instrument;

use crate::db;
use crate::db::profiles::Profile;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::NicknameBody;
use crate::routes::extract::ApiJson;
use crate::services::uploads::{self, AVATARS_BUCKET, MAX_IMAGE_BYTES, UploadError};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(show).patch(update_nickname))
        .route(
            "/profile/avatar",
            post(upload_avatar).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    id: UserId,
    email: Option<String>,
    nickname: Option<String>,
    avatar_url: Option<String>,
    role: UserRole,
}

impl ProfileResponse {
    fn new(id: UserId, email: Option<String>, profile: Option<Profile>) -> Self {
        match profile {
            Some(p) => Self {
                id,
                email,
                nickname: p.nickname,
                avatar_url: p.avatar_url,
                role: p.role,
            },
            None => Self {
                id,
                email,
                nickname: None,
                avatar_url: None,
                role: UserRole::default(),
            },
        }
    }
}

/// `GET /api/profile`. Users who never edited their profile get defaults.
async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ProfileResponse>> {
    let profile = db::profiles::get(state.pool(), user.id).await?;
    Ok(Json(ProfileResponse::new(user.id, user.email, profile)))
}

/// `PATCH /api/profile {nickname}`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
async fn update_nickname(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(body): ApiJson<NicknameBody>,
) -> Result<Json<ProfileResponse>> {
    let nickname = body.validate()?;
    let profile = db::profiles::set_nickname(state.pool(), user.id, &nickname).await?;
    Ok(Json(ProfileResponse::new(user.id, user.email, Some(profile))))
}

/// `POST /api/profile/avatar` (multipart, one image)
#[instrument(skip(state, user, multipart), fields(user_id = %user.id))]
async fn upload_avatar(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    mut multipart: Multipart,
) -> Result<Json<ProfileResponse>> {
    let Some(file) = uploads::read_images(&mut multipart, 1).await?.pop() else {
        return Err(UploadError::Missing.into());
    };
    let url = uploads::store_image(state.supabase(), AVATARS_BUCKET, user.id, file).await?;
    let profile = db::profiles::set_avatar(state.pool(), user.id, &url).await?;
    tracing::info!("avatar updated");
    Ok(Json(ProfileResponse::new(user.id, user.email, Some(profile))))
}

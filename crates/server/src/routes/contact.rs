//! Contact form route.

use axum::{
    Json, Router,
    extract::State,
    handler::Handler,
    http::StatusCode,
    routing::post,
};
use muhan_core::{ContactId, ContactStatus};
use serde::Serialize;
use tracing::instrument;

use crate::db;
use crate::error::Result;
use crate::middleware::{OptionalUser, contact_rate_limiter};
use crate::models::ContactBody;
use crate::routes::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/contact", post(submit.layer(contact_rate_limiter())))
}

#[derive(Serialize)]
struct ContactReceipt {
    id: ContactId,
    status: ContactStatus,
}

/// `POST /api/contact`: anonymous or signed in.
#[instrument(skip_all)]
async fn submit(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    ApiJson(body): ApiJson<ContactBody>,
) -> Result<(StatusCode, Json<ContactReceipt>)> {
    let contact = body.into_new_contact(user.map(|u| u.id))?;
    let saved = db::contacts::create(state.pool(), &contact).await?;
    tracing::info!(contact_id = %saved.id, category = ?saved.category, "contact submitted");
    Ok((
        StatusCode::CREATED,
        Json(ContactReceipt {
            id: saved.id,
            status: saved.status,
        }),
    ))
}

//! Admin API, mounted at `/api/admin`.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin):
//! 401 without a session, 403 for non-admins.

pub mod announcements;
pub mod contacts;
pub mod dashboard;
pub mod reviews;

use axum::{
    Router,
    routing::{get, patch, put},
};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard::stats))
        .route("/reviews", get(reviews::list))
        .route("/reports", get(reviews::reports))
        .route(
            "/announcements",
            get(announcements::list).post(announcements::create),
        )
        .route(
            "/announcements/{id}",
            put(announcements::update)
                .get(announcements::show)
                .delete(announcements::delete),
        )
        .route("/contacts", get(contacts::list))
        .route("/contacts/{id}", patch(contacts::update))
}

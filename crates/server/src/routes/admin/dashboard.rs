//! Dashboard counters.

use axum::{Json, extract::State};

use crate::db;
use crate::db::stats::DashboardStats;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /api/admin/stats`
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    Ok(Json(db::stats::dashboard(state.pool()).await?))
}

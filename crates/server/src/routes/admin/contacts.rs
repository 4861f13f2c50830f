//! Contact inbox.

use axum::{Json, extract::State};
use muhan_core::{ContactId, ContactStatus};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db;
use crate::db::contacts::Contact;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::ContactUpdateBody;
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactFilter {
    status: Option<String>,
}

impl ContactFilter {
    fn status(&self) -> Result<Option<ContactStatus>> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty() && *s != "all")
            .map(|s| {
                s.parse()
                    .map_err(|_| AppError::BadRequest(format!("알 수 없는 문의 상태입니다: {s}")))
            })
            .transpose()
    }
}

#[derive(Serialize)]
pub struct ContactList {
    contacts: Vec<Contact>,
}

/// `GET /api/admin/contacts?status=`
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiQuery(filter): ApiQuery<ContactFilter>,
) -> Result<Json<ContactList>> {
    let status = filter.status()?;
    let contacts = db::contacts::list(state.pool(), status).await?;
    Ok(Json(ContactList { contacts }))
}

/// `PATCH /api/admin/contacts/{id}`: status moves forward only.
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ContactId>,
    ApiJson(body): ApiJson<ContactUpdateBody>,
) -> Result<Json<Contact>> {
    let next = body.status()?;
    let current = db::contacts::get(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("문의를 찾을 수 없습니다.".to_owned()))?;

    if !current.status.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "문의 상태를 {}에서 {}(으)로 변경할 수 없습니다.",
            current.status, next
        )));
    }

    let note = body.admin_note.as_deref().map(str::trim);
    let updated = db::contacts::update_status(state.pool(), id, next, note).await?;
    tracing::info!(from = %current.status, to = %next, "contact status updated");
    Ok(Json(updated))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filter(status: Option<&str>) -> ContactFilter {
        ContactFilter {
            status: status.map(str::to_owned),
        }
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(filter(None).status().unwrap(), None);
        assert_eq!(filter(Some("all")).status().unwrap(), None);
        assert_eq!(
            filter(Some("pending")).status().unwrap(),
            Some(ContactStatus::Pending)
        );
        assert!(matches!(
            filter(Some("archived")).status(),
            Err(AppError::BadRequest(_))
        ));
    }
}

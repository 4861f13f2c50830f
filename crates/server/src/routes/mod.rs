//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Readiness (database ping)
//!
//! # Stores
//! GET    /api/stores                   - Nearby search / default recommendations
//! GET    /api/stores/filter            - Filtered + sorted search
//! GET    /api/stores/backup-filter     - In-memory fallback search
//! GET    /api/stores/{id}              - Store detail
//! GET    /api/categories               - Categories with store counts
//!
//! # Reviews
//! GET    /api/reviews?storeId=         - Reviews for a store + statistics
//! POST   /api/reviews                  - Create (cooldown) or edit own review
//! GET    /api/reviews/me               - Caller's reviews + statistics
//! POST   /api/reviews/images           - Upload up to 5 images
//! GET    /api/reviews/{id}             - One review
//! PUT    /api/reviews/{id}             - Edit (author)
//! DELETE /api/reviews/{id}             - Delete (author or admin)
//! POST   /api/reviews/{id}/report      - Report a review
//!
//! # Favorites (signed in)
//! GET    /api/favorites
//! POST   /api/favorites
//! GET    /api/favorites/{storeId}
//! DELETE /api/favorites/{storeId}
//!
//! # Other
//! GET    /api/announcements[/{id}]     - Published announcements
//! POST   /api/contact                  - Contact form
//! GET    /api/profile                  - Caller's profile
//! PATCH  /api/profile                  - Change nickname
//! POST   /api/profile/avatar           - Upload avatar
//! GET    /api/geocode?address=         - Address → coordinates
//! GET    /api/places/search?query=     - Place autocomplete
//!
//! # Admin (role = admin)
//! GET    /api/admin/stats
//! GET    /api/admin/reviews
//! GET    /api/admin/reports
//! GET    /api/admin/announcements      POST /api/admin/announcements
//! GET|PUT|DELETE /api/admin/announcements/{id}
//! GET    /api/admin/contacts?status=
//! PATCH  /api/admin/contacts/{id}
//! ```

pub mod admin;
pub mod announcements;
pub mod contact;
pub mod extract;
pub mod favorites;
pub mod geocode;
pub mod profile;
pub mod reviews;
pub mod stores;

use axum::Router;

use crate::state::AppState;

/// All `/api` routes.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(stores::routes())
        .merge(reviews::routes())
        .merge(favorites::routes())
        .merge(announcements::routes())
        .merge(contact::routes())
        .merge(profile::routes())
        .merge(geocode::routes())
        .nest("/admin", admin::routes());

    Router::new().nest("/api", api)
}

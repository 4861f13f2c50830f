//! Request and response shapes for the JSON API.
//!
//! Database row types live in [`crate::db`]; these are the validated request
//! bodies and the response views built from domain types.

pub mod requests;
pub mod store;

pub use requests::{
    AnnouncementBody, ContactBody, ContactUpdateBody, FavoriteBody, NicknameBody, ReportBody,
    ReviewBody,
};
pub use store::{StoreListResponse, StoreResponse};

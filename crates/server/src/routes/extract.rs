//! JSON-error variants of axum's extractors.
//!
//! axum's own rejections answer in plain text; these wrappers route them
//! through [`AppError`] so malformed input gets the usual error body.

use axum::extract::{FromRequest, FromRequestParts};
use serde::Deserialize;

use muhan_core::search::Pagination;

use crate::error::AppError;

/// `Json<T>` with [`AppError`] rejections.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query<T>` with [`AppError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `Path<T>` with [`AppError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `?page=&limit=` on paginated listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    #[must_use]
    pub fn pagination(self) -> Pagination {
        Pagination::new(self.page, self.limit)
    }
}

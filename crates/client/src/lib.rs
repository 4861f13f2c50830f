//! Muhan Client - typed access to the Muhan JSON API.
//!
//! - [`ApiClient`] - store search, reviews and favorites over HTTP
//! - [`FavoritesStore`] - cached favorites with optimistic add/remove
//!
//! Errors from every call are [`ClientError`]; API failures keep the server's
//! `code` and Korean `message`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod error;
pub mod favorites;
pub mod types;

pub use api::ApiClient;
pub use error::ClientError;
pub use favorites::{FavoritesApi, FavoritesStore};
pub use types::*;

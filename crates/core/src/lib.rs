//! Muhan Core - shared domain library.
//!
//! This crate provides the types and pure rules used by every Muhan component:
//! - `server` - JSON API over the hosted Postgres/PostGIS database
//! - `client` - typed API client and the favorites store
//! - `cli` - migrations and admin role management
//!
//! # Architecture
//!
//! No I/O lives here: no database access, no HTTP clients. The optional
//! `postgres` feature only adds `sqlx` encodings for IDs and enums.
//!
//! # Modules
//!
//! - [`types`] - IDs, coordinates, ratings, categories, reviews, statuses
//! - [`search`] - filter, sort and pagination over store candidates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod search;
pub mod types;

pub use types::*;

//! Ranking layer: filter, sort and paginate store candidates in memory.
//!
//! Candidates arrive either from the geospatial RPC (already radius-limited
//! and ordered by distance), from the default recommendation RPC, or from a
//! full table scan for the haversine fallback.

pub mod filter;
pub mod pagination;

pub use filter::{
    BACKUP_RATING_BASIS, DEFAULT_RADIUS_KM, DEFAULT_RECOMMENDATION_CAP, MAX_RADIUS_KM, SortOrder, StoreFilter,
    backup_filter, effective_radius_km, rank_default, rank_nearby, sort_stores,
};
pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageInfo, Pagination, paginate};

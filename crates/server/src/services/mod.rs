//! Business logic and outbound clients.
//!
//! - `supabase`: hosted auth (token → user) and object storage
//! - `geocoding`: Kakao Local address search and keyword places
//! - `uploads`: image validation and object naming
//! - `store_search`: search parameter validation and the three search paths
//! - `reviews`: review submission with cooldown, ownership rules

pub mod geocoding;
pub mod reviews;
pub mod store_search;
pub mod supabase;
pub mod uploads;

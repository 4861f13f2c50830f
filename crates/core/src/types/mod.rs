//! Domain types for Muhan.
//!
//! Type-safe wrappers and small pure rules shared by the server, the client
//! and the CLI.

pub mod announcement;
pub mod category;
pub mod email;
pub mod geo;
pub mod id;
pub mod rating;
pub mod review;
pub mod status;
pub mod store;

pub use announcement::resolve_published_at;
pub use category::{CategorySet, RawCategories, parse_category_param};
pub use email::{Email, EmailError};
pub use geo::{CoordinateError, Coordinates, LegacyPosition, haversine_km};
pub use id::*;
pub use rating::{ExternalRatings, RatingBasis, round_to_tenth};
pub use review::{
    CooldownScope, ReviewRating, ReviewStats, ReviewValidationError, SubRatings, SubmissionPlan,
    UserReviewStatistics, cooldown_remaining_minutes,
};
pub use status::*;
pub use store::{RankedStore, Store};

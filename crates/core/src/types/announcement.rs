//! Announcement publication state.

use chrono::{DateTime, Utc};

/// Limits for announcement text.
pub const MAX_TITLE_CHARS: usize = 200;

/// Work out `published_at` after a save.
///
/// - draft → published: stamped with `now`
/// - published → draft: cleared
/// - published → published: the original timestamp is kept (or `now` if a
///   legacy row was somehow published without one)
/// - draft → draft: stays empty
#[must_use]
pub fn resolve_published_at(
    was_published: bool,
    current: Option<DateTime<Utc>>,
    publish: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (was_published, publish) {
        (false, true) => Some(now),
        (true, true) => Some(current.unwrap_or(now)),
        (_, false) => None,
    }
}

//! Review values, the creation cooldown, and rating statistics.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::StoreId;
use super::rating::round_to_tenth;

/// Minimum interval between two review creations by the same user.
pub const REVIEW_COOLDOWN: TimeDelta = TimeDelta::minutes(10);

/// Maximum number of tags on one review.
pub const MAX_TAGS: usize = 10;

/// Maximum characters in one tag.
pub const MAX_TAG_CHARS: usize = 20;

/// Maximum characters of review text.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Maximum images attached to one review.
pub const MAX_REVIEW_IMAGES: usize = 5;

/// Validation failures for review input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewValidationError {
    #[error("rating must be an integer from 1 to 5 (got {0})")]
    RatingOutOfRange(i64),
    #[error("review content must be at most {MAX_CONTENT_CHARS} characters")]
    ContentTooLong,
    #[error("at most {MAX_TAGS} tags are allowed")]
    TooManyTags,
    #[error("tags must be 1 to {MAX_TAG_CHARS} characters")]
    InvalidTag,
    #[error("at most {MAX_REVIEW_IMAGES} images are allowed")]
    TooManyImages,
}

/// A star rating from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ReviewRating(u8);

impl ReviewRating {
    /// # Errors
    ///
    /// Returns [`ReviewValidationError::RatingOutOfRange`] outside 1..=5.
    pub fn new(value: i64) -> Result<Self, ReviewValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (1..=5).contains(v))
            .map(Self)
            .ok_or(ReviewValidationError::RatingOutOfRange(value))
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for ReviewRating {
    type Error = ReviewValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReviewRating> for i64 {
    fn from(rating: ReviewRating) -> Self {
        Self::from(rating.0)
    }
}

/// Optional per-aspect ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubRatings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taste: Option<ReviewRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ReviewRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ReviewRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanliness: Option<ReviewRating>,
}

impl SubRatings {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.taste.is_none()
            && self.value.is_none()
            && self.service.is_none()
            && self.cleanliness.is_none()
    }
}

/// Trim and validate review tags, dropping blanks and duplicates.
///
/// # Errors
///
/// Returns an error if there are too many tags or a tag is too long.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, ReviewValidationError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_CHARS {
            return Err(ReviewValidationError::InvalidTag);
        }
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_owned());
        }
    }
    if out.len() > MAX_TAGS {
        return Err(ReviewValidationError::TooManyTags);
    }
    Ok(out)
}

/// Validate free-text review content, returning the trimmed text.
///
/// # Errors
///
/// Returns [`ReviewValidationError::ContentTooLong`] past the limit.
pub fn normalize_content(content: &str) -> Result<String, ReviewValidationError> {
    let content = content.trim();
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(ReviewValidationError::ContentTooLong);
    }
    Ok(content.to_owned())
}

/// Which previous reviews count towards the creation cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CooldownScope {
    /// The user's most recent review on any store.
    #[default]
    Global,
    /// Only the user's most recent review on the same store.
    PerStore,
}

impl std::str::FromStr for CooldownScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "global" => Ok(Self::Global),
            "per_store" => Ok(Self::PerStore),
            other => Err(format!("invalid cooldown scope: {other}")),
        }
    }
}

/// Minutes the user must still wait before creating another review.
///
/// Returns `None` once the cooldown has elapsed. Otherwise returns
/// `ceil((cooldown - elapsed) / 1 minute)`, at least 1. A `last_created_at`
/// in the future counts as zero elapsed time.
#[must_use]
pub fn cooldown_remaining_minutes(
    last_created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<i64> {
    let elapsed = (now - last_created_at).max(TimeDelta::zero());
    if elapsed >= REVIEW_COOLDOWN {
        return None;
    }
    let remaining_ms = (REVIEW_COOLDOWN - elapsed).num_milliseconds();
    Some((remaining_ms + 59_999) / 60_000)
}

/// What a review submission should do for one (user, store) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPlan<Id> {
    /// The user already reviewed this store; edit in place, no cooldown.
    Edit(Id),
    /// No review yet and the cooldown has passed.
    Create,
    /// No review yet, but the user must wait this many whole minutes.
    CoolingDown { retry_after_minutes: i64 },
}

impl<Id> SubmissionPlan<Id> {
    /// Decide from the existing review (if any) and the creation time of the
    /// most recent review counted by the cooldown scope.
    pub fn decide(
        existing: Option<Id>,
        last_created_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        if let Some(id) = existing {
            return Self::Edit(id);
        }
        match last_created_at.and_then(|last| cooldown_remaining_minutes(last, now)) {
            Some(retry_after_minutes) => Self::CoolingDown {
                retry_after_minutes,
            },
            None => Self::Create,
        }
    }
}

/// Average rating and count for one store.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    /// Mean rating rounded to one decimal place; 0 when there are no reviews.
    pub average_rating: f64,
    pub review_count: u32,
}

impl ReviewStats {
    /// Aggregate raw ratings.
    pub fn from_ratings<I: IntoIterator<Item = u8>>(ratings: I) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_u32, 0_u32), |(s, c), r| (s + u32::from(r), c + 1));
        if count == 0 {
            return Self::default();
        }
        Self {
            average_rating: round_to_tenth(f64::from(sum) / f64::from(count)),
            review_count: count,
        }
    }
}

/// Group `(store, rating)` rows into per-store statistics.
pub fn aggregate_by_store<I>(rows: I) -> HashMap<StoreId, ReviewStats>
where
    I: IntoIterator<Item = (StoreId, u8)>,
{
    let mut grouped: HashMap<StoreId, Vec<u8>> = HashMap::new();
    for (store_id, rating) in rows {
        grouped.entry(store_id).or_default().push(rating);
    }
    grouped
        .into_iter()
        .map(|(id, ratings)| (id, ReviewStats::from_ratings(ratings)))
        .collect()
}

/// Statistics over one user's reviews.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReviewStatistics {
    pub average_rating: f64,
    pub total_reviews: u32,
    /// Count of 1★ through 5★ reviews.
    pub rating_distribution: [u32; 5],
}

impl UserReviewStatistics {
    pub fn from_ratings<I: IntoIterator<Item = u8>>(ratings: I) -> Self {
        let mut distribution = [0_u32; 5];
        let mut sum = 0_u32;
        let mut total = 0_u32;
        for rating in ratings {
            if let Some(slot) = usize::from(rating)
                .checked_sub(1)
                .and_then(|i| distribution.get_mut(i))
            {
                *slot += 1;
            }
            sum += u32::from(rating);
            total += 1;
        }
        let average_rating = if total == 0 {
            0.0
        } else {
            round_to_tenth(f64::from(sum) / f64::from(total))
        };
        Self {
            average_rating,
            total_reviews: total,
            rating_distribution: distribution,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(minutes: i64, seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
            + TimeDelta::minutes(minutes)
            + TimeDelta::seconds(seconds)
    }

    #[test]
    fn test_rating_bounds() {
        assert!(ReviewRating::new(0).is_err());
        assert!(ReviewRating::new(6).is_err());
        assert!(ReviewRating::new(-1).is_err());
        assert_eq!(ReviewRating::new(5).unwrap().get(), 5);
        assert!(serde_json::from_str::<ReviewRating>("3").is_ok());
        assert!(serde_json::from_str::<ReviewRating>("9").is_err());
    }

    #[test]
    fn test_cooldown_just_created() {
        let t = at(0, 0);
        assert_eq!(cooldown_remaining_minutes(t, t), Some(10));
    }

    #[test]
    fn test_cooldown_rounds_up() {
        // 3m30s elapsed -> 6m30s left -> 7 minutes
        assert_eq!(cooldown_remaining_minutes(at(0, 0), at(3, 30)), Some(7));
        // 9m59s elapsed -> 1s left -> 1 minute
        assert_eq!(cooldown_remaining_minutes(at(0, 0), at(9, 59)), Some(1));
        // exactly 4m elapsed -> 6 minutes
        assert_eq!(cooldown_remaining_minutes(at(0, 0), at(4, 0)), Some(6));
    }

    #[test]
    fn test_cooldown_elapsed() {
        assert_eq!(cooldown_remaining_minutes(at(0, 0), at(10, 0)), None);
        assert_eq!(cooldown_remaining_minutes(at(0, 0), at(60, 0)), None);
    }

    #[test]
    fn test_cooldown_future_timestamp() {
        assert_eq!(cooldown_remaining_minutes(at(5, 0), at(0, 0)), Some(10));
    }

    #[test]
    fn test_existing_review_is_edited_without_cooldown() {
        let plan = SubmissionPlan::decide(Some(42), Some(at(0, 0)), at(0, 30));
        assert_eq!(plan, SubmissionPlan::Edit(42));
    }

    #[test]
    fn test_new_review_inside_cooldown() {
        let plan: SubmissionPlan<i32> = SubmissionPlan::decide(None, Some(at(0, 0)), at(2, 0));
        assert_eq!(
            plan,
            SubmissionPlan::CoolingDown {
                retry_after_minutes: 8
            }
        );
    }

    #[test]
    fn test_new_review_after_cooldown_or_first_ever() {
        let after: SubmissionPlan<i32> = SubmissionPlan::decide(None, Some(at(0, 0)), at(10, 1));
        assert_eq!(after, SubmissionPlan::Create);
        let first: SubmissionPlan<i32> = SubmissionPlan::decide(None, None, at(0, 0));
        assert_eq!(first, SubmissionPlan::Create);
    }

    #[test]
    fn test_stats_rounding() {
        let stats = ReviewStats::from_ratings([5, 4, 4]);
        assert_eq!(stats.review_count, 3);
        assert!((stats.average_rating - 4.3).abs() < f64::EPSILON);
        assert_eq!(ReviewStats::from_ratings([]), ReviewStats::default());
    }

    #[test]
    fn test_aggregate_by_store() {
        let a = StoreId::new(1);
        let b = StoreId::new(2);
        let stats = aggregate_by_store([(a, 5), (b, 2), (a, 3), (b, 3)]);
        assert_eq!(stats[&a].review_count, 2);
        assert!((stats[&a].average_rating - 4.0).abs() < f64::EPSILON);
        assert!((stats[&b].average_rating - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_user_statistics() {
        let stats = UserReviewStatistics::from_ratings([5, 5, 1, 4]);
        assert_eq!(stats.total_reviews, 4);
        assert_eq!(stats.rating_distribution, [1, 0, 0, 1, 2]);
        assert!((stats.average_rating - 3.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![
            " 가성비 ".to_owned(),
            String::new(),
            "가성비".to_owned(),
            "친절".to_owned(),
        ];
        assert_eq!(normalize_tags(&tags).unwrap(), vec!["가성비", "친절"]);

        let too_long = vec!["a".repeat(MAX_TAG_CHARS + 1)];
        assert_eq!(normalize_tags(&too_long), Err(ReviewValidationError::InvalidTag));

        let many: Vec<String> = (0..=MAX_TAGS).map(|i| format!("t{i}")).collect();
        assert_eq!(normalize_tags(&many), Err(ReviewValidationError::TooManyTags));
    }

    #[test]
    fn test_sub_ratings_skip_missing() {
        let sub = SubRatings {
            taste: Some(ReviewRating::new(5).unwrap()),
            ..SubRatings::default()
        };
        assert_eq!(serde_json::to_string(&sub).unwrap(), r#"{"taste":5}"#);
        assert!(SubRatings::default().is_empty());
    }
}

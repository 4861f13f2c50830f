//! Review submission and ownership rules.

use chrono::{DateTime, Utc};
use muhan_core::{
    CooldownScope, ReviewId, ReviewStats, StoreId, SubmissionPlan, UserId, UserReviewStatistics,
};
use sqlx::PgPool;
use tracing::instrument;

use crate::db;
use crate::db::reviews::{Review, ReviewInput};
use crate::error::{AppError, Result};

/// Outcome of [`submit`].
#[derive(Debug)]
pub enum Submission {
    Created(Review),
    /// The user already had a review for the store; it was edited in place.
    Updated(Review),
}

impl Submission {
    #[must_use]
    pub const fn review(&self) -> &Review {
        match self {
            Self::Created(r) | Self::Updated(r) => r,
        }
    }

    #[must_use]
    pub const fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Create a review, or edit the caller's existing review for the same store.
///
/// Only creation is gated by the cooldown. A concurrent duplicate insert is
/// caught by the `(user_id, store_id)` constraint and surfaces as 409.
///
/// # Errors
///
/// - `NotFound` if the store does not exist
/// - `Cooldown` if a review was created within the last ten minutes
/// - `Conflict` if a concurrent request created the review first
#[instrument(skip(pool, input), fields(user_id = %user_id, store_id = %store_id))]
pub async fn submit(
    pool: &PgPool,
    scope: CooldownScope,
    user_id: UserId,
    store_id: StoreId,
    input: &ReviewInput,
    now: DateTime<Utc>,
) -> Result<Submission> {
    if !db::stores::exists(pool, store_id).await? {
        return Err(AppError::NotFound("가게를 찾을 수 없습니다.".to_owned()));
    }

    let existing = db::reviews::find_for_user_and_store(pool, user_id, store_id).await?;
    let last_created_at = if existing.is_some() {
        None
    } else {
        let scope_store = match scope {
            CooldownScope::Global => None,
            CooldownScope::PerStore => Some(store_id),
        };
        db::reviews::last_created_at(pool, user_id, scope_store).await?
    };

    match SubmissionPlan::decide(existing, last_created_at, now) {
        SubmissionPlan::Edit(id) => {
            let review = db::reviews::update(pool, id, input).await?;
            tracing::info!(review_id = %id, "review edited in place");
            Ok(Submission::Updated(review))
        }
        SubmissionPlan::Create => {
            let review = db::reviews::create(pool, user_id, store_id, input).await?;
            tracing::info!(review_id = %review.id, "review created");
            Ok(Submission::Created(review))
        }
        SubmissionPlan::CoolingDown {
            retry_after_minutes,
        } => {
            tracing::info!(retry_after_minutes, "review creation cooling down");
            Err(AppError::Cooldown {
                retry_after_minutes,
            })
        }
    }
}

/// Load a review, or 404.
///
/// # Errors
///
/// Returns `NotFound` if there is no such review.
pub async fn require(pool: &PgPool, id: ReviewId) -> Result<Review> {
    db::reviews::get(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("리뷰를 찾을 수 없습니다.".to_owned()))
}

/// Only the author may edit a review.
///
/// # Errors
///
/// Returns `Forbidden` for anyone else.
pub fn ensure_can_edit(review: &Review, caller: UserId) -> Result<()> {
    if review.user_id == caller {
        Ok(())
    } else {
        Err(AppError::Forbidden("본인이 작성한 리뷰만 수정할 수 있습니다.".to_owned()))
    }
}

/// The author or an admin may delete a review.
///
/// # Errors
///
/// Returns `Forbidden` for anyone else.
pub fn ensure_can_delete(review: &Review, caller: UserId, caller_is_admin: bool) -> Result<()> {
    if review.user_id == caller || caller_is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("리뷰를 삭제할 권한이 없습니다.".to_owned()))
    }
}

/// Users cannot report their own reviews.
///
/// # Errors
///
/// Returns `BadRequest` when the reporter wrote the review.
pub fn ensure_can_report(review: &Review, reporter: UserId) -> Result<()> {
    if review.user_id == reporter {
        Err(AppError::BadRequest("본인이 작성한 리뷰는 신고할 수 없습니다.".to_owned()))
    } else {
        Ok(())
    }
}

fn star(rating: i16) -> Option<u8> {
    u8::try_from(rating).ok()
}

/// Per-store statistics over loaded reviews.
pub fn store_stats<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> ReviewStats {
    ReviewStats::from_ratings(reviews.into_iter().filter_map(|r| star(r.rating)))
}

/// Statistics over one user's reviews.
pub fn user_stats<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> UserReviewStatistics {
    UserReviewStatistics::from_ratings(reviews.into_iter().filter_map(|r| star(r.rating)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use uuid::Uuid;

    use super::*;

    fn review(author: UserId, rating: i16) -> Review {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        Review {
            id: ReviewId::new(1),
            user_id: author,
            store_id: StoreId::new(1),
            rating,
            content: None,
            images: vec![],
            taste_rating: None,
            value_rating: None,
            service_rating: None,
            cleanliness_rating: None,
            tags: vec![],
            created_at: at,
            updated_at: at,
        }
    }

    fn user(n: u128) -> UserId {
        UserId::new(Uuid::from_u128(n))
    }

    #[test]
    fn test_edit_is_author_only() {
        let r = review(user(1), 4);
        assert!(ensure_can_edit(&r, user(1)).is_ok());
        assert!(matches!(
            ensure_can_edit(&r, user(2)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_delete_allows_admin() {
        let r = review(user(1), 4);
        assert!(ensure_can_delete(&r, user(1), false).is_ok());
        assert!(ensure_can_delete(&r, user(2), true).is_ok());
        assert!(ensure_can_delete(&r, user(2), false).is_err());
    }

    #[test]
    fn test_cannot_report_own_review() {
        let r = review(user(1), 4);
        assert!(matches!(
            ensure_can_report(&r, user(1)),
            Err(AppError::BadRequest(_))
        ));
        assert!(ensure_can_report(&r, user(2)).is_ok());
    }

    #[test]
    fn test_statistics_round_to_tenth() {
        let reviews = [review(user(1), 5), review(user(2), 4), review(user(3), 4)];
        let stats = store_stats(&reviews);
        assert!((stats.average_rating - 4.3).abs() < 1e-9);
        assert_eq!(stats.review_count, 3);

        let mine = user_stats(&reviews);
        assert_eq!(mine.total_reviews, 3);
        assert_eq!(mine.rating_distribution, [0, 0, 0, 2, 1]);
    }

    #[test]
    fn test_submission_accessors() {
        let s = Submission::Created(review(user(1), 3));
        assert!(s.created());
        assert_eq!(s.review().rating, 3);
        assert!(!Submission::Updated(review(user(1), 3)).created());
    }
}

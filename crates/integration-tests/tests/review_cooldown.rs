//! Review create/edit decisions over time, and announcement publication.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use muhan_core::{
    ReviewId, ReviewStats, SubmissionPlan, UserReviewStatistics, cooldown_remaining_minutes,
    resolve_published_at,
};

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn test_second_review_within_ten_minutes_is_throttled() {
    let first = noon();
    let plan = SubmissionPlan::<ReviewId>::decide(None, Some(first), first + TimeDelta::minutes(3));
    assert_eq!(
        plan,
        SubmissionPlan::CoolingDown {
            retry_after_minutes: 7
        }
    );
}

#[test]
fn test_remaining_minutes_round_up() {
    let first = noon();
    let cases = [
        (TimeDelta::zero(), Some(10)),
        (TimeDelta::milliseconds(1), Some(10)),
        (TimeDelta::seconds(61), Some(9)),
        (TimeDelta::milliseconds(599_999), Some(1)),
        (TimeDelta::minutes(10), None),
        (TimeDelta::hours(2), None),
    ];
    for (elapsed, expected) in cases {
        assert_eq!(
            cooldown_remaining_minutes(first, first + elapsed),
            expected,
            "elapsed {elapsed}"
        );
    }
}

#[test]
fn test_existing_review_is_edited_regardless_of_cooldown() {
    let plan = SubmissionPlan::decide(Some(ReviewId::new(8)), Some(noon()), noon());
    assert_eq!(plan, SubmissionPlan::Edit(ReviewId::new(8)));
}

#[test]
fn test_first_review_is_created() {
    let plan = SubmissionPlan::<ReviewId>::decide(None, None, noon());
    assert_eq!(plan, SubmissionPlan::Create);
}

#[test]
fn test_statistics_match_raw_ratings() {
    let ratings = [5_u8, 4, 4, 2];
    let stats = ReviewStats::from_ratings(ratings);
    assert!((stats.average_rating - 3.8).abs() < 1e-9);
    assert_eq!(stats.review_count, 4);

    let mine = UserReviewStatistics::from_ratings(ratings);
    assert_eq!(mine.total_reviews, 4);
    assert_eq!(mine.rating_distribution, [0, 1, 0, 2, 1]);
}

#[test]
fn test_announcement_publication_transitions() {
    let now = noon();
    let earlier = now - TimeDelta::days(3);

    assert_eq!(resolve_published_at(false, None, true, now), Some(now));
    assert_eq!(resolve_published_at(true, Some(earlier), false, now), None);
    assert_eq!(
        resolve_published_at(true, Some(earlier), true, now),
        Some(earlier)
    );
    assert_eq!(resolve_published_at(false, None, false, now), None);
}

//! External rating sources and how they are combined.

use serde::{Deserialize, Serialize};

/// Ratings scraped from the two external map services, each 0–5 when present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalRatings {
    pub naver: Option<f64>,
    pub kakao: Option<f64>,
}

/// How the two rating sources are collapsed into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RatingBasis {
    /// The better of the two sources. Used by the geospatial search paths.
    #[default]
    Max,
    /// The mean of the sources that are present. Used by the fallback filter.
    Mean,
}

impl ExternalRatings {
    #[must_use]
    pub const fn new(naver: Option<f64>, kakao: Option<f64>) -> Self {
        Self { naver, kakao }
    }

    fn present(&self) -> impl Iterator<Item = f64> {
        [self.naver, self.kakao]
            .into_iter()
            .flatten()
            .filter(|r| r.is_finite())
    }

    /// Combined score, or `None` when neither source has rated the store.
    #[must_use]
    pub fn score(&self, basis: RatingBasis) -> Option<f64> {
        match basis {
            RatingBasis::Max => self.present().reduce(f64::max),
            RatingBasis::Mean => {
                let (sum, count) = self.present().fold((0.0, 0_u32), |(s, c), r| (s + r, c + 1));
                (count > 0).then(|| sum / f64::from(count))
            }
        }
    }

    /// Whether the combined score reaches `min`. Unrated stores never do.
    #[must_use]
    pub fn meets(&self, min: f64, basis: RatingBasis) -> bool {
        self.score(basis).is_some_and(|score| score >= min)
    }
}

/// Round to one decimal place, the precision ratings are displayed with.
#[must_use]
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_basis() {
        let r = ExternalRatings::new(Some(3.9), Some(4.4));
        assert_eq!(r.score(RatingBasis::Max), Some(4.4));
        assert!(r.meets(4.0, RatingBasis::Max));
    }

    #[test]
    fn test_mean_basis() {
        let r = ExternalRatings::new(Some(3.5), Some(4.5));
        assert_eq!(r.score(RatingBasis::Mean), Some(4.0));
        assert!(r.meets(4.0, RatingBasis::Mean));
        assert!(!r.meets(4.1, RatingBasis::Mean));
    }

    #[test]
    fn test_single_source_is_used_alone() {
        let r = ExternalRatings::new(None, Some(4.2));
        assert_eq!(r.score(RatingBasis::Max), Some(4.2));
        assert_eq!(r.score(RatingBasis::Mean), Some(4.2));
    }

    #[test]
    fn test_unrated_never_meets_threshold() {
        let r = ExternalRatings::default();
        assert_eq!(r.score(RatingBasis::Max), None);
        assert!(!r.meets(0.0, RatingBasis::Max));
    }

    #[test]
    fn test_round_to_tenth() {
        assert!((round_to_tenth(4.349) - 4.3).abs() < f64::EPSILON);
        assert!((round_to_tenth(4.35) - 4.4).abs() < 1e-9);
        assert!((round_to_tenth(3.0) - 3.0).abs() < f64::EPSILON);
    }
}

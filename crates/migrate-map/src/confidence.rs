//! Review triage for links by score.
//!
//! Auto links are sorted into levels by their similarity score so a host can
//! tell users which links to trust and which to check. Manual links carry no
//! score and are counted separately.

use migrate_model::{Link, LinkOrigin};

/// How much review an auto link needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// What a user should do with links at this level.
    pub fn description(self) -> &'static str {
        match self {
            Self::High => "keep as matched",
            Self::Medium => "spot-check the pairing",
            Self::Low => "confirm by hand",
        }
    }
}

/// Named threshold sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfidenceProfile {
    #[default]
    Standard,
    /// Pushes more links into review.
    Strict,
    /// Trusts lower scores, for exploratory runs.
    Relaxed,
}

/// Lower bounds of each level; a score below `low` is uncategorized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self::for_profile(ConfidenceProfile::Standard)
    }
}

impl ConfidenceThresholds {
    pub fn for_profile(profile: ConfidenceProfile) -> Self {
        let (high, medium, low) = match profile {
            ConfidenceProfile::Standard => (0.95, 0.80, 0.60),
            ConfidenceProfile::Strict => (0.98, 0.90, 0.75),
            ConfidenceProfile::Relaxed => (0.90, 0.70, 0.50),
        };
        Self { high, medium, low }
    }

    /// Level for a score, or `None` below the `low` bound.
    #[must_use]
    pub fn categorize(&self, score: f64) -> Option<ConfidenceLevel> {
        ConfidenceLevel::ALL
            .into_iter()
            .zip([self.high, self.medium, self.low])
            .find(|&(_, bound)| score >= bound)
            .map(|(level, _)| level)
    }

    /// Sort links into review buckets.
    #[must_use]
    pub fn review(&self, links: &[Link]) -> ConfidenceReport {
        let mut report = ConfidenceReport::default();
        for link in links {
            match (link.origin, link.score) {
                (LinkOrigin::Manual, _) | (LinkOrigin::Auto, None) => report.manual += 1,
                (LinkOrigin::Auto, Some(score)) => match self.categorize(score) {
                    Some(ConfidenceLevel::High) => report.high += 1,
                    Some(ConfidenceLevel::Medium) => report.medium += 1,
                    Some(ConfidenceLevel::Low) => report.low += 1,
                    None => report.uncategorized += 1,
                },
            }
        }
        report
    }
}

/// Link counts per review bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfidenceReport {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Auto links scoring below the `low` bound.
    pub uncategorized: usize,
    /// Links without a score.
    pub manual: usize,
}

impl ConfidenceReport {
    pub fn count(&self, level: ConfidenceLevel) -> usize {
        match level {
            ConfidenceLevel::High => self.high,
            ConfidenceLevel::Medium => self.medium,
            ConfidenceLevel::Low => self.low,
        }
    }

    /// Auto links below the high bound.
    pub fn needs_review(&self) -> usize {
        self.medium + self.low + self.uncategorized
    }

    pub fn total(&self) -> usize {
        self.high + self.needs_review() + self.manual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorize_boundaries() {
        let thresholds = ConfidenceThresholds::default();
        assert_eq!(thresholds.categorize(0.95), Some(ConfidenceLevel::High));
        assert_eq!(thresholds.categorize(0.85), Some(ConfidenceLevel::Medium));
        assert_eq!(thresholds.categorize(0.60), Some(ConfidenceLevel::Low));
        assert_eq!(thresholds.categorize(0.59), None);
    }

    #[test]
    fn profiles_shift_levels() {
        let strict = ConfidenceThresholds::for_profile(ConfidenceProfile::Strict);
        let relaxed = ConfidenceThresholds::for_profile(ConfidenceProfile::Relaxed);
        assert_eq!(strict.categorize(0.8), Some(ConfidenceLevel::Low));
        assert_eq!(relaxed.categorize(0.8), Some(ConfidenceLevel::Medium));
        assert_eq!(relaxed.categorize(0.5), Some(ConfidenceLevel::Low));
        assert_eq!(strict.categorize(0.5), None);
    }

    #[test]
    fn review_buckets() {
        let links = vec![
            Link::auto(1, 101, 1.0),
            Link::auto(2, 102, 0.82),
            Link::auto(3, 103, 0.3),
            Link::manual(4, 104),
        ];
        let report = ConfidenceThresholds::default().review(&links);
        assert_eq!(
            report,
            ConfidenceReport {
                high: 1,
                medium: 1,
                low: 0,
                uncategorized: 1,
                manual: 1,
            }
        );
        assert_eq!(report.needs_review(), 2);
        assert_eq!(report.total(), links.len());
        assert_eq!(report.count(ConfidenceLevel::Medium), 1);
    }
}

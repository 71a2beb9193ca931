//! Two-tier cutoffs shared by every trust check.
//!
//! Accuracy, distance, speed and staleness all follow the same shape: a value
//! past the soft cutoff is tolerated but worth a log line, a value past the
//! hard cutoff is an anomaly. Comparisons are strict, so a value sitting
//! exactly on a cutoff stays in the lower tier.

use serde::{Deserialize, Serialize};

/// Where a measured value falls relative to a [`TieredThreshold`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// At or below the soft cutoff.
    Within,
    /// Above the soft cutoff, at or below the hard one.
    Degraded,
    /// Above the hard cutoff.
    Exceeded,
}

impl Tier {
    /// Returns whether the value crossed the hard cutoff.
    #[must_use]
    pub const fn is_exceeded(self) -> bool {
        matches!(self, Self::Exceeded)
    }
}

/// A soft/hard pair of cutoffs.
///
/// # Examples
///
/// ```
/// use geotrust_core::location::{Tier, TieredThreshold};
///
/// let accuracy = TieredThreshold::doubling(200.0);
/// assert_eq!(accuracy.classify(150.0), Tier::Within);
/// assert_eq!(accuracy.classify(399.0), Tier::Degraded);
/// assert_eq!(accuracy.classify(401.0), Tier::Exceeded);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieredThreshold {
    /// Values above this are degraded.
    pub soft: f64,
    /// Values above this are rejected.
    pub hard: f64,
}

impl TieredThreshold {
    /// Soft cutoff at `base`, hard cutoff at twice `base`.
    #[must_use]
    pub fn doubling(base: f64) -> Self {
        Self {
            soft: base,
            hard: base * 2.0,
        }
    }

    /// A single cutoff: anything above `limit` is rejected outright.
    #[must_use]
    pub const fn single(limit: f64) -> Self {
        Self {
            soft: limit,
            hard: limit,
        }
    }

    /// Classifies `value`.
    ///
    /// NaN and infinities are treated as exceeding the hard cutoff, since a
    /// reading that cannot be measured cannot be trusted.
    #[must_use]
    pub fn classify(&self, value: f64) -> Tier {
        if !value.is_finite() || value > self.hard {
            Tier::Exceeded
        } else if value > self.soft {
            Tier::Degraded
        } else {
            Tier::Within
        }
    }

    /// Classifies an optional value; a missing value is [`Tier::Within`].
    #[must_use]
    pub fn classify_opt(&self, value: Option<f64>) -> Tier {
        value.map_or(Tier::Within, |v| self.classify(v))
    }
}

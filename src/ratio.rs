use serde::Serialize;

use crate::classify::Severity;
use crate::tree::ComplexityTree;

/// Smallest share a non-empty bucket is drawn with.
pub const VISIBILITY_FLOOR: f64 = 0.1;

/// Share of functions per severity bucket: green=low, yellow=medium,
/// red=high, brown=critical.
///
/// Floored shares are kept as display weights and may sum above 1;
/// [`ColorRatio::renormalized`] rescales them when a partition is needed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ColorRatio {
    pub green: f64,
    pub yellow: f64,
    pub red: f64,
    pub brown: f64,
}

impl ColorRatio {
    /// `counts` is indexed by `Severity::index()`.
    pub fn from_counts(counts: [usize; 4]) -> Self {
        let total: usize = counts.iter().sum();
        let divisor = total.max(1) as f64;
        let share = |count: usize| {
            let value = count as f64 / divisor;
            if count > 0 && value < VISIBILITY_FLOOR {
                VISIBILITY_FLOOR
            } else {
                value
            }
        };
        Self {
            green: share(counts[0]),
            yellow: share(counts[1]),
            red: share(counts[2]),
            brown: share(counts[3]),
        }
    }

    pub fn from_tree(tree: &ComplexityTree) -> Self {
        Self::from_counts(tree.severity_counts())
    }

    pub fn get(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.green,
            Severity::Medium => self.yellow,
            Severity::High => self.red,
            Severity::Critical => self.brown,
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.green, self.yellow, self.red, self.brown]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Same proportions scaled to sum to 1. An all-zero ratio stays all zero.
    pub fn renormalized(&self) -> Self {
        let total = self.sum();
        if total <= 0.0 {
            return Self::default();
        }
        Self {
            green: self.green / total,
            yellow: self.yellow / total,
            red: self.red / total,
            brown: self.brown / total,
        }
    }

    pub fn percentages(&self) -> [f64; 4] {
        self.as_array().map(|value| value * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_yields_all_zero() {
        let ratio = ColorRatio::from_counts([0, 0, 0, 0]);
        assert_eq!(ratio, ColorRatio::default());
        assert_eq!(ratio.renormalized(), ColorRatio::default());
    }

    #[test]
    fn plain_shares_without_floor() {
        let ratio = ColorRatio::from_counts([2, 1, 1, 0]);
        assert!((ratio.green - 0.5).abs() < 1e-12);
        assert!((ratio.yellow - 0.25).abs() < 1e-12);
        assert!((ratio.red - 0.25).abs() < 1e-12);
        assert_eq!(ratio.brown, 0.0);
        assert!((ratio.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn small_buckets_are_floored_and_not_renormalized() {
        let ratio = ColorRatio::from_counts([97, 1, 1, 1]);
        assert!((ratio.green - 0.97).abs() < 1e-12);
        assert_eq!(ratio.yellow, VISIBILITY_FLOOR);
        assert_eq!(ratio.red, VISIBILITY_FLOOR);
        assert_eq!(ratio.brown, VISIBILITY_FLOOR);
        assert!(ratio.sum() > 1.0);
    }

    #[test]
    fn renormalized_sums_to_one() {
        let ratio = ColorRatio::from_counts([97, 1, 1, 1]).renormalized();
        assert!((ratio.sum() - 1.0).abs() < 1e-12);
        assert!(ratio.green > ratio.brown);
    }

    #[test]
    fn lookup_by_severity() {
        let ratio = ColorRatio::from_counts([1, 1, 1, 1]);
        assert_eq!(ratio.get(Severity::Critical), 0.25);
        assert_eq!(ratio.percentages(), [25.0, 25.0, 25.0, 25.0]);
    }
}

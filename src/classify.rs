use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Severity bucket for a complexity score. Ordered: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    pub fn color(&self) -> ColorToken {
        match self {
            Severity::Low => ColorToken::Green,
            Severity::Medium => ColorToken::Yellow,
            Severity::High => ColorToken::Red,
            Severity::Critical => ColorToken::Brown,
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display color bucket; the theme resolves it to concrete fill/stroke values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Green,
    Yellow,
    Red,
    Brown,
}

impl ColorToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorToken::Green => "green",
            ColorToken::Yellow => "yellow",
            ColorToken::Red => "red",
            ColorToken::Brown => "brown",
        }
    }
}

/// Scores at which each bucket starts. `medium` is the first Medium score,
/// `high` the first High score and `critical` the first Critical score.
/// Without `critical` the classifier degrades to three levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub medium: u32,
    pub high: u32,
    pub critical: Option<u32>,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            medium: 10,
            high: 15,
            critical: Some(20),
        }
    }
}

impl Thresholds {
    pub fn new(medium: u32, high: u32, critical: Option<u32>) -> Result<Self, ConfigError> {
        let thresholds = Self {
            medium,
            high,
            critical,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn three_level(medium: u32, high: u32) -> Result<Self, ConfigError> {
        Self::new(medium, high, None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.medium == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        let ascending = self.medium < self.high && self.critical.is_none_or(|c| self.high < c);
        if !ascending {
            return Err(ConfigError::NonAscendingThresholds {
                medium: self.medium,
                high: self.high,
                critical: self.critical,
            });
        }
        Ok(())
    }

    pub fn level(&self, complexity: u32) -> Severity {
        if complexity < self.medium {
            Severity::Low
        } else if complexity < self.high {
            Severity::Medium
        } else {
            match self.critical {
                Some(critical) if complexity >= critical => Severity::Critical,
                _ => Severity::High,
            }
        }
    }

    pub fn color(&self, complexity: u32) -> ColorToken {
        self.level(complexity).color()
    }

    /// Human-readable description of the buckets, e.g. `Low<10, Medium 10-14, ...`.
    pub fn describe(&self) -> String {
        match self.critical {
            Some(critical) => format!(
                "Low<{}, Medium {}-{}, High {}-{}, Critical>={}",
                self.medium,
                self.medium,
                self.high - 1,
                self.high,
                critical - 1,
                critical
            ),
            None => format!(
                "Low<{}, Medium {}-{}, High>={}",
                self.medium,
                self.medium,
                self.high - 1,
                self.high
            ),
        }
    }
}

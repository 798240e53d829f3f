use serde::{Deserialize, Serialize};
use crate::errors::DocfreshError;
use crate::models::Severity;

/// Relative weight of each freshness factor; the four must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub structural: f64,
    pub semantic: f64,
    pub recency: f64,
    pub completeness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            structural: 0.40,
            semantic: 0.30,
            recency: 0.20,
            completeness: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.structural + self.semantic + self.recency + self.completeness
    }
}

/// Penalty points per issue, by severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuePenalties {
    pub critical: f64,
    pub major: f64,
    pub minor: f64,
}

impl Default for IssuePenalties {
    fn default() -> Self {
        Self { critical: 3.0, major: 1.5, minor: 0.5 }
    }
}

/// Every tunable constant of the freshness scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub weights: ScoreWeights,
    pub penalties: IssuePenalties,
    /// Scores strictly below this are critical
    pub critical_below: f64,
    /// Scores strictly below this (and not critical) are major
    pub major_below: f64,
    pub recency_window_days: f64,
    pub recency_floor: f64,
    /// Used when a last-modified date is present but cannot be parsed
    pub unparseable_recency: f64,
    pub completeness_floor: f64,
    pub completeness_divisor: f64,
    pub confidence_floor: f64,
    pub confidence_step: f64,
    pub max_signal_units: u32,
    /// Added when a parseable last-modified date backs the recency factor
    pub dated_confidence_bonus: f64,
    pub confidence_cap: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            penalties: IssuePenalties::default(),
            critical_below: 40.0,
            major_below: 70.0,
            recency_window_days: 300.0,
            recency_floor: 0.5,
            unparseable_recency: 0.8,
            completeness_floor: 0.2,
            completeness_divisor: 10.0,
            confidence_floor: 0.30,
            confidence_step: 0.05,
            max_signal_units: 11,
            dated_confidence_bonus: 0.10,
            confidence_cap: 0.95,
        }
    }
}

impl ScoringPolicy {
    pub fn severity_for(&self, score: f64) -> Severity {
        if score < self.critical_below {
            Severity::Critical
        } else if score < self.major_below {
            Severity::Major
        } else {
            Severity::Minor
        }
    }

    pub fn validate(&self) -> Result<(), DocfreshError> {
        let total = self.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(DocfreshError::Config(format!(
                "Scoring weights must sum to 1.0 (got {:.4})", total
            )));
        }
        if self.critical_below >= self.major_below {
            return Err(DocfreshError::Config(format!(
                "critical_below ({}) must be lower than major_below ({})",
                self.critical_below, self.major_below
            )));
        }
        for (name, value) in [
            ("recency_floor", self.recency_floor),
            ("unparseable_recency", self.unparseable_recency),
            ("completeness_floor", self.completeness_floor),
            ("confidence_floor", self.confidence_floor),
            ("confidence_cap", self.confidence_cap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DocfreshError::Config(format!("{} must be within [0, 1] (got {})", name, value)));
            }
        }
        if self.recency_window_days <= 0.0 || self.completeness_divisor <= 0.0 {
            return Err(DocfreshError::Config(
                "recency_window_days and completeness_divisor must be positive".into(),
            ));
        }
        Ok(())
    }
}

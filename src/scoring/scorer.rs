use std::collections::BTreeMap;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::Severity;
use crate::utils::round_to;
use super::policy::ScoringPolicy;

/// Raw evidence gathered for one documented file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessMetrics {
    pub total_functions: u32,
    pub functions_with_docstrings: u32,
    pub total_params: u32,
    pub documented_params: u32,
    pub critical_issues: u32,
    pub major_issues: u32,
    pub minor_issues: u32,
    pub last_updated_iso: Option<String>,
}

impl FreshnessMetrics {
    pub fn total_issues(&self) -> u32 {
        self.critical_issues
            .saturating_add(self.major_issues)
            .saturating_add(self.minor_issues)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreshnessScore {
    pub freshness_score: f64,
    pub severity: Severity,
    pub confidence: f64,
    pub components: BTreeMap<String, f64>,
}

enum Recency {
    Unknown,
    Dated(DateTime<Utc>),
    Unparseable,
}

/// Deterministic weighted freshness score for one file.
///
/// `as_of` anchors the recency decay so repeated runs over the same evidence
/// agree.
pub fn score(metrics: &FreshnessMetrics, policy: &ScoringPolicy, as_of: DateTime<Utc>) -> FreshnessScore {
    let penalty = metrics.critical_issues as f64 * policy.penalties.critical
        + metrics.major_issues as f64 * policy.penalties.major
        + metrics.minor_issues as f64 * policy.penalties.minor;

    let structural = structural_match(metrics);
    let semantic = (100.0 - penalty).max(0.0) / 100.0;
    let recency_signal = recency_of(metrics.last_updated_iso.as_deref());
    let recency = recency_factor(&recency_signal, policy, as_of);
    let completeness = if metrics.total_issues() == 0 {
        1.0
    } else {
        (1.0 - penalty / policy.completeness_divisor).max(policy.completeness_floor)
    };

    let w = &policy.weights;
    let raw = 100.0
        * (w.structural * structural
            + w.semantic * semantic
            + w.recency * recency
            + w.completeness * completeness);
    let freshness_score = round_to(raw, 2);

    let units = metrics
        .total_functions
        .saturating_add(metrics.total_params)
        .saturating_add(metrics.total_issues())
        .min(policy.max_signal_units);
    let mut confidence = policy.confidence_floor + policy.confidence_step * units as f64;
    if matches!(recency_signal, Recency::Dated(_)) {
        confidence += policy.dated_confidence_bonus;
    }
    let confidence = round_to(confidence.min(policy.confidence_cap), 3);

    let components = BTreeMap::from([
        ("structural_match".to_string(), round_to(structural, 3)),
        ("semantic_accuracy".to_string(), round_to(semantic, 3)),
        ("recency_factor".to_string(), round_to(recency, 3)),
        ("completeness".to_string(), round_to(completeness, 3)),
    ]);

    FreshnessScore {
        freshness_score,
        severity: policy.severity_for(freshness_score),
        confidence,
        components,
    }
}

fn structural_match(m: &FreshnessMetrics) -> f64 {
    let function_ratio = (m.total_functions > 0)
        .then(|| m.functions_with_docstrings.min(m.total_functions) as f64 / m.total_functions as f64);
    let param_ratio = (m.total_params > 0)
        .then(|| m.documented_params.min(m.total_params) as f64 / m.total_params as f64);

    match (function_ratio, param_ratio) {
        (Some(f), Some(p)) => (f + p) / 2.0,
        (Some(f), None) => f,
        (None, Some(p)) => p,
        (None, None) if m.total_issues() > 0 => 0.5,
        (None, None) => 1.0,
    }
}

fn recency_of(value: Option<&str>) -> Recency {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Recency::Unknown,
        Some(s) => parse_timestamp(s).map_or(Recency::Unparseable, Recency::Dated),
    }
}

fn recency_factor(signal: &Recency, policy: &ScoringPolicy, as_of: DateTime<Utc>) -> f64 {
    match signal {
        Recency::Unknown => 1.0,
        Recency::Unparseable => policy.unparseable_recency,
        Recency::Dated(at) => {
            let days = (as_of - *at).num_seconds().max(0) as f64 / 86_400.0;
            let decay = (1.0 - policy.recency_floor) * days / policy.recency_window_days;
            (1.0 - decay).max(policy.recency_floor)
        }
    }
}

/// Accepts RFC 3339, naive ISO datetimes (taken as UTC) and bare dates.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

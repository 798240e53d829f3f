//! Normalization of loosely structured pipeline output into an [`AnalysisReport`].
//!
//! Upstream stages emit text that usually contains a JSON array, in one of two
//! shapes (see [`shape::OutputShape`]). Normalization never fails: anything that
//! cannot be interpreted degrades to an empty report.

pub mod aliases;
pub mod extract;
pub mod findings;
pub mod issue;
pub mod recommendations;
pub mod rollup;
pub mod scored;
pub mod shape;

use tracing::debug;
use crate::models::AnalysisReport;
use aliases::{FieldAliases, DEFAULT_ALIASES};
use shape::OutputShape;

pub use shape::classify;

/// Normalize raw stage output with the default alias table.
pub fn normalize(raw: &str) -> AnalysisReport {
    normalize_with(raw, &DEFAULT_ALIASES)
}

pub fn normalize_with(raw: &str, aliases: &FieldAliases) -> AnalysisReport {
    let Some(items) = extract::extract_array(raw) else {
        debug!(raw_len = raw.len(), "No analysis array found in output");
        return AnalysisReport::empty();
    };

    let shape = classify(&items, aliases);
    let mut files = match shape {
        OutputShape::Scored => scored::transform(&items, aliases),
        OutputShape::FindingList => findings::transform(&items, aliases),
    };

    for file in files.iter_mut().filter(|f| f.recommendations.is_empty()) {
        file.recommendations = recommendations::synthesize(&file.issues);
    }

    debug!(?shape, files = files.len(), "Normalized analysis output");
    rollup::summarize(files)
}

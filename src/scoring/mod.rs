pub mod policy;
pub mod scorer;

pub use policy::{IssuePenalties, ScoreWeights, ScoringPolicy};
pub use scorer::{parse_timestamp, score, FreshnessMetrics, FreshnessScore};

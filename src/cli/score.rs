use chrono::Utc;
use crate::cli::commands::ScoreArgs;
use crate::errors::DocfreshError;
use crate::scoring::{parse_timestamp, score, FreshnessMetrics};

pub async fn handle_score(args: ScoreArgs) -> Result<(), DocfreshError> {
    let config = super::resolve_config(args.config.as_deref()).await?;
    let raw = super::read_input(&args.input).await?;
    let metrics: FreshnessMetrics = serde_json::from_str(&raw)
        .map_err(|e| DocfreshError::InvalidInput(format!("Invalid metrics JSON: {}", e)))?;

    let as_of = match args.as_of.as_deref() {
        Some(value) => parse_timestamp(value)
            .ok_or_else(|| DocfreshError::InvalidInput(format!("Invalid --as-of timestamp: {}", value)))?,
        None => Utc::now(),
    };

    let result = score(&metrics, &config.scoring, as_of);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

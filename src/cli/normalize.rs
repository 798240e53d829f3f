use serde_json::json;
use crate::analysis;
use crate::cli::commands::NormalizeArgs;
use crate::errors::DocfreshError;

pub async fn handle_normalize(args: NormalizeArgs) -> Result<(), DocfreshError> {
    let raw = super::read_input(&args.input).await?;
    let report = analysis::normalize(&raw);

    if args.summary {
        let summary = json!({
            "total_files": report.total_files,
            "critical_issues": report.critical_issues,
            "major_issues": report.major_issues,
            "minor_issues": report.minor_issues,
            "average_score": report.average_score,
            "severity": report.severity,
            "overall_health": report.overall_health(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

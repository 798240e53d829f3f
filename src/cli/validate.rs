use std::path::PathBuf;
use crate::cli::commands::ValidateArgs;
use crate::config;
use crate::errors::DocfreshError;

pub async fn handle_validate(args: ValidateArgs) -> Result<(), DocfreshError> {
    let path = PathBuf::from(&args.config);
    let parsed = config::parse_config(&path).await?;
    parsed.pipeline_config()?;
    println!("Configuration is valid: {}", args.config);
    Ok(())
}

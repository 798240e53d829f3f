use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "docfresh", version, about = "Documentation freshness auditor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve(ServeArgs),
    /// Audit a project's documentation from the terminal
    Audit(AuditArgs),
    /// Score one file's freshness metrics (JSON)
    Score(ScoreArgs),
    /// Normalize raw pipeline output into a canonical analysis report
    Normalize(NormalizeArgs),
    /// List past audits
    History(HistoryArgs),
    /// Show a stored report
    Report(ReportArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen port [default: from config, else 8000]
    #[arg(long)]
    pub port: Option<u16>,

    /// Listen address [default: from config, else 127.0.0.1]
    #[arg(long)]
    pub host: Option<String>,

    /// SQLite database path
    #[arg(long)]
    pub db: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct AuditArgs {
    /// Project directory to audit
    pub path: String,

    /// Project name [default: directory name]
    #[arg(short, long)]
    pub name: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// SQLite database path
    #[arg(long)]
    pub db: Option<String>,

    /// Approve the draft report without prompting
    #[arg(long, conflicts_with = "feedback")]
    pub auto_approve: bool,

    /// Reviewer feedback to apply without prompting
    #[arg(long)]
    pub feedback: Option<String>,

    /// Skip the review step entirely
    #[arg(long)]
    pub no_review: bool,

    /// Only run the analysis stages and store a preview to apply later
    #[arg(long)]
    pub preview: bool,

    /// Print the stored report as JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ScoreArgs {
    /// JSON file with freshness metrics ("-" reads stdin)
    pub input: String,

    /// YAML configuration file supplying the scoring policy
    #[arg(short, long)]
    pub config: Option<String>,

    /// Reference time for recency (RFC 3339) [default: now]
    #[arg(long)]
    pub as_of: Option<String>,
}

#[derive(Args, Clone)]
pub struct NormalizeArgs {
    /// File with raw pipeline output ("-" reads stdin)
    pub input: String,

    /// Print only the summary counts
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Clone)]
pub struct HistoryArgs {
    /// Only show audits of this project id
    #[arg(long)]
    pub project: Option<String>,

    /// SQLite database path
    #[arg(long)]
    pub db: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ReportArgs {
    /// Report ID
    pub report_id: String,

    /// SQLite database path
    #[arg(long)]
    pub db: Option<String>,

    /// Output the full report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    pub config: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audit_flags() {
        let cli = Cli::parse_from(["docfresh", "-vv", "audit", "./proj", "--auto-approve", "--db", "x.db"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Audit(args) => {
                assert_eq!(args.path, "./proj");
                assert!(args.auto_approve);
                assert_eq!(args.db.as_deref(), Some("x.db"));
                assert!(!args.preview);
            }
            _ => panic!("expected audit"),
        }
    }

    #[test]
    fn test_auto_approve_conflicts_with_feedback() {
        let result = Cli::try_parse_from(["docfresh", "audit", ".", "--auto-approve", "--feedback", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_serve_defaults_unset() {
        let cli = Cli::parse_from(["docfresh", "--log-json", "serve"]);
        assert!(cli.log_json);
        match cli.command {
            Commands::Serve(args) => {
                assert!(args.port.is_none());
                assert!(args.config.is_none());
            }
            _ => panic!("expected serve"),
        }
    }
}

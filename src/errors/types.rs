use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocfreshError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("No pending feedback request: {0}")]
    NoPendingRequest(String),

    #[error("Wait slot already registered for report {0}")]
    DuplicateWaitSlot(String),

    #[error("Stage error: {0}")]
    Stage(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocfreshError {
    /// Process exit code used by the CLI when a command fails with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            DocfreshError::Config(_) => 2,
            DocfreshError::Database(_) => 3,
            DocfreshError::Stage(_) | DocfreshError::Timeout(_) => 4,
            DocfreshError::InvalidInput(_) => 5,
            DocfreshError::NotFound(_) => 6,
            _ => 1,
        }
    }
}

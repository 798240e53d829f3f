use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub project_path: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub report_id: String,
    /// Empty or absent approves the draft as-is
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct FindProjectQuery {
    pub name: String,
    pub path: String,
}

use serde::{Deserialize, Serialize};

/// A documented codebase under audit, unique by `(name, path)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub path: String,
    pub created_at: String,
}

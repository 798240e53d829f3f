pub mod analyze;
pub mod health;
pub mod hitl;
pub mod projects;
pub mod reports;

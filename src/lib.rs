//! docfresh: audits a project's documentation for staleness relative to its
//! code and produces a scored, file-by-file report with optional human review.

pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod producers;
pub mod reporting;
pub mod scoring;
pub mod utils;

pub mod formatter;

pub use formatter::{append_reviewer_feedback, format_report_markdown};

pub mod formatting;
pub mod truncation;

pub use formatting::{format_duration, format_score, round_to};
pub use truncation::{preview, truncate_error};

const MAX_PREVIEW_LENGTH: usize = 200;
const MAX_ERROR_LENGTH: usize = 2_000;

/// Cut `text` to at most `max` bytes on a char boundary, appending `...` when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

pub fn truncate_error(error: &str) -> String {
    truncate_chars(error, MAX_ERROR_LENGTH)
}

/// Single-line preview of a draft for log fields.
pub fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&flat, MAX_PREVIEW_LENGTH)
}

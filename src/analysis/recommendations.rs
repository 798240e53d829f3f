use crate::models::Issue;

/// One actionable line per issue with text; optional clauses are omitted when empty.
pub fn synthesize(issues: &[Issue]) -> Vec<String> {
    issues.iter().filter_map(recommend).collect()
}

fn recommend(issue: &Issue) -> Option<String> {
    let text = issue.issue.trim();
    if text.is_empty() {
        return None;
    }

    let mut rec = format!("Fix: {}", text);
    let location = issue.location.trim();
    if !location.is_empty() {
        rec.push_str(&format!(" (at {})", location));
    }
    let actual = issue.actual.trim();
    if !actual.is_empty() {
        rec.push_str(&format!(" — update docs to match: {}", actual));
    }
    let tags: Vec<&str> = [issue.fix_priority.trim(), issue.severity.trim()]
        .into_iter()
        .filter(|t| !t.is_empty())
        .collect();
    if !tags.is_empty() {
        rec.push_str(&format!("  [{}]", tags.join(", ")));
    }
    Some(rec)
}

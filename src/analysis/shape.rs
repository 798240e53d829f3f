use serde_json::Value;
use super::aliases::{first_str, FieldAliases};

/// Structural variant of raw pipeline output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// One object per file carrying its own `freshness_score`.
    Scored,
    /// One object per issue; files and scores are derived.
    FindingList,
}

pub fn classify(items: &[Value], aliases: &FieldAliases) -> OutputShape {
    let scored = items.iter().any(|item| {
        item.as_object().map_or(false, |obj| {
            first_str(obj, aliases.file_path).is_some() && obj.contains_key("freshness_score")
        })
    });
    if scored {
        OutputShape::Scored
    } else {
        OutputShape::FindingList
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use crate::analysis::aliases::DEFAULT_ALIASES;

    #[test]
    fn test_scored_when_any_item_has_score() {
        let items = vec![
            json!({"file_path": "a.py", "issue": "x"}),
            json!({"file": "b.py", "freshness_score": "55"}),
        ];
        assert_eq!(classify(&items, &DEFAULT_ALIASES), OutputShape::Scored);
    }

    #[test]
    fn test_score_without_path_is_finding_list() {
        let items = vec![json!({"freshness_score": 80}), json!("loose text")];
        assert_eq!(classify(&items, &DEFAULT_ALIASES), OutputShape::FindingList);
    }
}

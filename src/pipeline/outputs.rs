use std::sync::LazyLock;
use regex::Regex;
use serde_json::Value;
use super::state::{StageName, StageOutput};

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n(.*?)```").expect("valid fence regex")
});
static BRACKET_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[.*\]").expect("valid bracket regex")
});

const ANALYSIS_KEYS: &[&str] = &["file_path", "freshness_score", "issues", "severity"];

/// Raw texts selected from a finished run, ready for `finalize_report`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedOutputs {
    pub analysis_raw: Option<String>,
    pub audit_raw: Option<String>,
    pub report_md: String,
}

pub fn collect_outputs(outputs: &[StageOutput]) -> CollectedOutputs {
    let latest = |stage: StageName| {
        outputs.iter().rev().find(|o| o.stage == stage).map(|o| o.raw.as_str())
    };

    let analysis_raw = latest(StageName::Scoring)
        .and_then(extract_analysis_array)
        .or_else(|| latest(StageName::Suggestion).and_then(extract_analysis_array))
        .or_else(|| {
            // Audit evidence nests file objects too; it is never analysis output.
            outputs
                .iter()
                .rev()
                .filter(|o| o.stage != StageName::Audit)
                .find_map(|o| extract_analysis_array(&o.raw))
        });

    CollectedOutputs {
        analysis_raw,
        audit_raw: latest(StageName::Audit).map(str::to_string),
        report_md: latest(StageName::Suggestion).unwrap_or_default().to_string(),
    }
}

/// Analysis array embedded in `text`: fenced blocks first, then the whole
/// text, then the widest bracketed span.
pub fn extract_analysis_array(text: &str) -> Option<String> {
    let fenced = FENCED_BLOCK.captures_iter(text).filter_map(|c| c.get(1).map(|m| m.as_str()));
    let whole = std::iter::once(text);
    let span = BRACKET_SPAN.find(text).map(|m| m.as_str());

    fenced
        .chain(whole)
        .chain(span)
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate.trim()).ok())
        .find(is_analysis_array)
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
}

fn is_analysis_array(value: &Value) -> bool {
    let Value::Array(items) = value else { return false };
    items.iter().any(|item| {
        item.as_object()
            .is_some_and(|obj| ANALYSIS_KEYS.iter().any(|k| obj.contains_key(*k)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_wins() {
        let text = "Report\n\n```json\n[{\"file_path\": \"a.md\", \"severity\": \"minor\"}]\n```\n\nSee [1].";
        let found = extract_analysis_array(text).unwrap();
        let value: Value = serde_json::from_str(&found).unwrap();
        assert_eq!(value[0]["file_path"], "a.md");
    }

    #[test]
    fn test_whole_text_and_bracket_fallbacks() {
        assert!(extract_analysis_array("[{\"issues\": []}]").is_some());
        assert!(extract_analysis_array("prefix [{\"freshness_score\": 10}] suffix").is_some());
    }

    #[test]
    fn test_rejects_non_analysis_arrays() {
        assert!(extract_analysis_array("[]").is_none());
        assert!(extract_analysis_array("[1, 2, 3]").is_none());
        assert!(extract_analysis_array("[{\"name\": \"x\"}]").is_none());
        assert!(extract_analysis_array("{\"files\": []}").is_none());
        assert!(extract_analysis_array("no json here").is_none());
    }

    #[test]
    fn test_selection_by_stage() {
        let outputs = vec![
            StageOutput::new(StageName::Audit, "{\"files\": []}"),
            StageOutput::new(StageName::Scoring, "[{\"file_path\": \"from-scoring\"}]"),
            StageOutput::new(
                StageName::Suggestion,
                "# Report\n```json\n[{\"file_path\": \"from-suggestion\"}]\n```",
            ),
        ];
        let collected = collect_outputs(&outputs);
        assert!(collected.analysis_raw.unwrap().contains("from-scoring"));
        assert_eq!(collected.audit_raw.as_deref(), Some("{\"files\": []}"));
        assert!(collected.report_md.starts_with("# Report"));
    }

    #[test]
    fn test_falls_back_to_suggestion_output() {
        let outputs = vec![
            StageOutput::new(StageName::Scoring, "[]"),
            StageOutput::new(StageName::Suggestion, "```\n[{\"severity\": \"major\"}]\n```"),
        ];
        let collected = collect_outputs(&outputs);
        assert!(collected.analysis_raw.unwrap().contains("major"));
        assert!(collected.audit_raw.is_none());
    }

    #[test]
    fn test_no_candidates() {
        let audit = "{\"files\": [{\"file_path\": \"a.md\", \"findings\": []}]}";
        let collected = collect_outputs(&[StageOutput::new(StageName::Audit, audit)]);
        assert!(collected.analysis_raw.is_none());
        assert_eq!(collected.report_md, "");
    }
}

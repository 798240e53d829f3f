use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use async_trait::async_trait;
use regex::Regex;
use crate::errors::DocfreshError;
use crate::models::Severity;
use super::{display_path, AuditFinding, DocCoverage, FindingProducer, ProducerReport};

const DOC_TYPE: &str = "docstring";
const MAX_SIGNATURE_LINES: usize = 20;

static DEF_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").expect("valid def regex")
});
static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)def\s+[A-Za-z_]\w*\s*\((.*)\)\s*(?:->[^:]*)?:\s*(?:#.*)?$").expect("valid signature regex")
});
static SPHINX_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[:@]param)\s+(?:[\w\[\]., ]+?\s+)?(\w+)\s*:?").expect("valid param regex")
});
static GOOGLE_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+\*{0,2}(\w+)\s*(?:\([^)]*\))?\s*:").expect("valid arg regex")
});

/// A function definition with its docstring, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PyFunction {
    pub name: String,
    pub line: usize,
    pub signature: String,
    pub params: Vec<String>,
    pub docstring: Option<String>,
}

/// Checks Python function docstrings against their signatures.
pub struct DocstringProducer;

impl DocstringProducer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocstringProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FindingProducer for DocstringProducer {
    fn name(&self) -> &str {
        "docstring"
    }

    fn applies_to(&self, relative: &Path) -> bool {
        relative.extension().and_then(|e| e.to_str()) == Some("py")
    }

    async fn produce(&self, root: &Path, relative: &Path) -> Result<ProducerReport, DocfreshError> {
        let source = tokio::fs::read_to_string(root.join(relative)).await?;
        Ok(analyze_source(&display_path(relative), &source))
    }
}

/// Coverage and findings for one Python source file.
pub fn analyze_source(file_path: &str, source: &str) -> ProducerReport {
    let mut coverage = DocCoverage::default();
    let mut findings = Vec::new();

    // Private and dunder functions are not part of the documented surface.
    for func in parse_functions(source).into_iter().filter(|f| !f.name.starts_with('_')) {
        coverage.total_functions += 1;
        coverage.total_params += func.params.len() as u32;

        let Some(doc) = &func.docstring else {
            findings.push(finding(
                file_path,
                &func,
                Severity::Major,
                format!("Function '{}' has no docstring", func.name),
                format!("A docstring describing '{}'", func.name),
                "No docstring present".to_string(),
                "Callers have no reference for this function's behavior",
                "Medium",
            ));
            continue;
        };
        coverage.functions_with_docstrings += 1;

        let words: HashSet<&str> = doc
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| !w.is_empty())
            .collect();
        let missing: Vec<&str> = func
            .params
            .iter()
            .map(String::as_str)
            .filter(|p| !words.contains(p))
            .collect();
        coverage.documented_params += (func.params.len() - missing.len()) as u32;

        if !missing.is_empty() {
            findings.push(finding(
                file_path,
                &func,
                Severity::Minor,
                format!("Docstring of '{}' does not mention parameter(s): {}", func.name, missing.join(", ")),
                format!("Docstring documents {}", missing.join(", ")),
                func.signature.clone(),
                "Readers cannot tell what the undocumented arguments do",
                "Low",
            ));
        }

        let params: HashSet<&str> = func.params.iter().map(String::as_str).collect();
        for stale in documented_params(doc).into_iter().filter(|p| !params.contains(p.as_str())) {
            findings.push(finding(
                file_path,
                &func,
                Severity::Critical,
                format!("Docstring of '{}' documents '{}', which is not a parameter", func.name, stale),
                format!("'{}' accepts a parameter named '{}'", func.name, stale),
                func.signature.clone(),
                "Callers following the docs will pass an argument that no longer exists",
                "High",
            ));
        }
    }

    ProducerReport {
        doc_type: Some(DOC_TYPE.to_string()),
        findings,
        coverage: Some(coverage),
        last_updated_iso: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn finding(
    file_path: &str,
    func: &PyFunction,
    severity: Severity,
    issue: String,
    expected: String,
    actual: String,
    impact: &str,
    priority: &str,
) -> AuditFinding {
    AuditFinding {
        file_path: file_path.to_string(),
        doc_type: DOC_TYPE.to_string(),
        severity,
        issue,
        location: format!("Line {}", func.line),
        expected,
        actual,
        impact: impact.to_string(),
        fix_priority: priority.to_string(),
    }
}

/// Single pass over the source collecting `def` blocks and their docstrings.
pub fn parse_functions(source: &str) -> Vec<PyFunction> {
    let lines: Vec<&str> = source.lines().collect();
    let mut functions = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = DEF_START.captures(lines[i]) else {
            i += 1;
            continue;
        };
        let name = caps[1].to_string();
        let start = i;

        // Signatures may span lines; they end at the first line ending in ':'.
        let mut end = i;
        while end < lines.len()
            && end - start < MAX_SIGNATURE_LINES
            && !strip_comment(lines[end]).trim_end().ends_with(':')
        {
            end += 1;
        }
        if end >= lines.len() || end - start >= MAX_SIGNATURE_LINES {
            i += 1;
            continue;
        }

        let joined = lines[start..=end].iter().map(|l| l.trim()).collect::<Vec<_>>().join(" ");
        let params = SIGNATURE
            .captures(&joined)
            .map(|c| parse_params(&c[1]))
            .unwrap_or_default();
        let (docstring, next) = read_docstring(&lines, end + 1);

        functions.push(PyFunction {
            name,
            line: start + 1,
            signature: joined.trim_end_matches(':').trim().to_string(),
            params,
            docstring,
        });
        i = next.max(end + 1);
    }

    functions
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Split a parameter list at top-level commas and keep the bare names.
fn parse_params(list: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in list.chars() {
        match c {
            '(' | '[' | '{' => { depth += 1; current.push(c); }
            ')' | ']' | '}' => { depth -= 1; current.push(c); }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);

    parts
        .iter()
        .filter_map(|p| {
            let p = p.trim().trim_start_matches('*');
            let name = p.split([':', '=']).next().unwrap_or("").trim();
            let valid = !name.is_empty()
                && name != "self"
                && name != "cls"
                && name != "/"
                && name.chars().all(|c| c.is_alphanumeric() || c == '_');
            valid.then(|| name.to_string())
        })
        .collect()
}

/// Docstring starting at or after `from`, plus the index of the line after it.
fn read_docstring(lines: &[&str], from: usize) -> (Option<String>, usize) {
    let mut idx = from;
    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }
    let Some(first) = lines.get(idx).map(|l| l.trim()) else {
        return (None, from);
    };

    let unprefixed = first.trim_start_matches(['r', 'R', 'u', 'U']);
    let quote = if unprefixed.starts_with("\"\"\"") {
        "\"\"\""
    } else if unprefixed.starts_with("'''") {
        "'''"
    } else {
        return (None, from);
    };

    let body = &unprefixed[3..];
    if let Some(close) = body.find(quote) {
        return (Some(body[..close].trim().to_string()), idx + 1);
    }

    let mut text = vec![body.to_string()];
    let mut j = idx + 1;
    while j < lines.len() {
        if let Some(close) = lines[j].find(quote) {
            text.push(lines[j][..close].to_string());
            return (Some(text.join("\n").trim().to_string()), j + 1);
        }
        text.push(lines[j].to_string());
        j += 1;
    }
    // Unterminated docstring: treat the remainder as the docstring.
    (Some(text.join("\n").trim().to_string()), lines.len())
}

/// Parameter names a docstring claims to document (Sphinx/Epydoc fields and Google `Args:` sections).
fn documented_params(doc: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |n: &str| {
        if !names.iter().any(|x| x == n) {
            names.push(n.to_string());
        }
    };

    for caps in SPHINX_PARAM.captures_iter(doc) {
        push(&caps[1]);
    }

    let mut in_args = false;
    let mut args_indent = 0usize;
    for line in doc.lines() {
        let trimmed = line.trim();
        let indent = line.len() - line.trim_start().len();
        if matches!(trimmed, "Args:" | "Arguments:" | "Parameters:") {
            in_args = true;
            args_indent = indent;
            continue;
        }
        if !in_args {
            continue;
        }
        if trimmed.is_empty() || (indent <= args_indent && trimmed.ends_with(':')) {
            in_args = !trimmed.is_empty() && !trimmed.ends_with(':');
            if !in_args {
                continue;
            }
        }
        if indent > args_indent {
            if let Some(caps) = GOOGLE_ARG.captures(line) {
                // Continuation lines are indented deeper than the argument names.
                if indent <= args_indent + 4 {
                    push(&caps[1]);
                }
            }
        } else {
            in_args = false;
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
import os

def documented(path, mode="r"):
    """Open path with the given mode."""
    return open(path, mode)

def undocumented(a, b):
    return a + b

async def partial(self, url: str, *, timeout: float = 3.0, **kwargs):
    """
    Fetch a URL.

    Args:
        url: where to go
        retries: how often to retry
    """
    pass

def multi_line(
    first,
    second: dict[str, int] = {},
) -> int:
    '''Uses first and second.'''
    return 1

def _private(x):
    return x

def sphinx(value):
    """Convert.

    :param value: the input
    :param str encoding: the encoding
    """
    return value
"#;

    #[test]
    fn test_parse_functions() {
        let funcs = parse_functions(SOURCE);
        let names: Vec<&str> = funcs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["documented", "undocumented", "partial", "multi_line", "_private", "sphinx"]);

        assert_eq!(funcs[0].params, vec!["path", "mode"]);
        assert_eq!(funcs[0].docstring.as_deref(), Some("Open path with the given mode."));
        assert!(funcs[1].docstring.is_none());
        assert_eq!(funcs[2].params, vec!["url", "timeout", "kwargs"]);
        assert_eq!(funcs[3].params, vec!["first", "second"]);
        assert_eq!(funcs[3].line, 21);
    }

    #[test]
    fn test_coverage_counts() {
        let report = analyze_source("pkg/mod.py", SOURCE);
        let cov = report.coverage.unwrap();
        // _private is excluded
        assert_eq!(cov.total_functions, 5);
        assert_eq!(cov.functions_with_docstrings, 4);
        assert_eq!(cov.total_params, 2 + 2 + 3 + 2 + 1);
        // documented: path, mode, url, first, second, value
        assert_eq!(cov.documented_params, 6);
        assert_eq!(report.doc_type.as_deref(), Some("docstring"));
    }

    #[test]
    fn test_findings_by_severity() {
        let report = analyze_source("pkg/mod.py", SOURCE);
        let missing_doc: Vec<_> = report.findings.iter().filter(|f| f.severity == Severity::Major).collect();
        assert_eq!(missing_doc.len(), 1);
        assert!(missing_doc[0].issue.contains("undocumented"));
        assert_eq!(missing_doc[0].location, "Line 8");

        let stale: Vec<&str> = report
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Critical)
            .map(|f| f.issue.as_str())
            .collect();
        assert_eq!(stale.len(), 2);
        assert!(stale.iter().any(|s| s.contains("'retries'")));
        assert!(stale.iter().any(|s| s.contains("'encoding'")));

        let partial = report
            .findings
            .iter()
            .find(|f| f.severity == Severity::Minor)
            .unwrap();
        assert!(partial.issue.contains("timeout, kwargs"));
        assert_eq!(partial.file_path, "pkg/mod.py");
    }

    #[test]
    fn test_empty_source() {
        let report = analyze_source("empty.py", "");
        assert!(report.findings.is_empty());
        assert_eq!(report.coverage.unwrap(), DocCoverage::default());
    }

    #[test]
    fn test_parse_params_edge_cases() {
        assert_eq!(parse_params("self, a, /, b=1, *, c"), vec!["a", "b", "c"]);
        assert_eq!(parse_params("x: Dict[str, int] = f(1, 2), *args"), vec!["x", "args"]);
        assert!(parse_params("").is_empty());
    }
}

//! Issue batch file parsing.
//!
//! A batch file is a sequence of issues, each introduced by a header line:
//!
//! ```text
//! ## [ISSUE-001] Set up the project
//! Labels: setup, priority-high
//! Assignees: alice
//! Depends: ISSUE-000
//! Blocks: ISSUE-002, ISSUE-003
//! Related: ISSUE-010
//!
//! Free-form body text, up to the next header or `---` separator.
//! ```
//!
//! Metadata lines are only recognised between the header and the first blank
//! line. Everything after that blank line is body text.

use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

use crate::domain::Issue;

/// Errors produced while reading a batch file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid header format, expected '## [ID] Title'")]
    InvalidHeader { line: usize },

    #[error("no issues found in file")]
    NoIssues,

    #[error("duplicate issue ID found: {id}")]
    DuplicateId { id: String },
}

/// Regex for header lines: `## [ID] Title`
///
/// The opening bracket is optional; the closing bracket is required.
static HEADER_REGEX: OnceLock<Regex> = OnceLock::new();

fn header_regex() -> &'static Regex {
    HEADER_REGEX
        .get_or_init(|| Regex::new(r"^## \[?([^\]]*)\](.*)$").expect("Header regex should compile"))
}

const SEPARATOR: &str = "---";

/// Read and parse a batch file from disk.
pub fn parse_issues_file(path: &Path) -> Result<Vec<Issue>, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_issues(&content)
}

/// Parse batch file content into issues, in file order.
pub fn parse_issues(content: &str) -> Result<Vec<Issue>, ParseError> {
    let mut builder = BatchBuilder::default();

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed == SEPARATOR {
            builder.finish_current();
            continue;
        }

        if line.starts_with("## ") {
            let captures = header_regex()
                .captures(line)
                .ok_or(ParseError::InvalidHeader { line: index + 1 })?;
            builder.finish_current();
            builder.current = Some(Issue::new(captures[1].trim(), captures[2].trim()));
            continue;
        }

        builder.accept_line(line, trimmed);
    }

    builder.finish_current();
    let issues = builder.issues;

    if issues.is_empty() {
        return Err(ParseError::NoIssues);
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = issues.iter().find(|issue| !seen.insert(issue.id.as_str())) {
        return Err(ParseError::DuplicateId {
            id: duplicate.id.clone(),
        });
    }

    debug!(issues = issues.len(), "parsed batch file");
    Ok(issues)
}

#[derive(Default)]
struct BatchBuilder {
    issues: Vec<Issue>,
    current: Option<Issue>,
    body_lines: Vec<String>,
    in_body: bool,
}

impl BatchBuilder {
    fn accept_line(&mut self, line: &str, trimmed: &str) {
        let Some(issue) = self.current.as_mut() else {
            return;
        };

        if !self.in_body {
            if let Some((key, value)) = trimmed.split_once(':') {
                let target = match key {
                    "Labels" => Some(&mut issue.labels),
                    "Assignees" => Some(&mut issue.assignees),
                    "Depends" => Some(&mut issue.depends_on),
                    "Blocks" => Some(&mut issue.blocks),
                    "Related" => Some(&mut issue.related),
                    _ => None,
                };
                if let Some(target) = target {
                    *target = parse_comma_separated(value);
                    return;
                }
            }

            if trimmed.is_empty() {
                self.in_body = true;
            }
            return;
        }

        self.body_lines.push(line.to_string());
    }

    fn finish_current(&mut self) {
        if let Some(mut issue) = self.current.take() {
            if !self.body_lines.is_empty() {
                issue.body = self.body_lines.join("\n").trim().to_string();
            }
            self.issues.push(issue);
        }
        self.body_lines.clear();
        self.in_body = false;
    }
}

fn parse_comma_separated(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_single_issue_with_all_metadata() {
        let content = "## [ISSUE-001] First Issue
Labels: bug, enhancement
Assignees: user1, user2
Depends: ISSUE-002
Blocks: ISSUE-003
Related: ISSUE-004

This is the body of the first issue.
It can have multiple lines.";

        let issues = parse_issues(content).unwrap();
        assert_eq!(issues.len(), 1);

        let issue = &issues[0];
        assert_eq!(issue.id, "ISSUE-001");
        assert_eq!(issue.title, "First Issue");
        assert_eq!(issue.labels, vec!["bug", "enhancement"]);
        assert_eq!(issue.assignees, vec!["user1", "user2"]);
        assert_eq!(issue.depends_on, vec!["ISSUE-002"]);
        assert_eq!(issue.blocks, vec!["ISSUE-003"]);
        assert_eq!(issue.related, vec!["ISSUE-004"]);
        assert_eq!(
            issue.body,
            "This is the body of the first issue.\nIt can have multiple lines."
        );
    }

    #[test]
    fn test_multiple_issues_with_separator() {
        let content = "## [ISSUE-001] First Issue
Labels: bug

First issue body
---
## [ISSUE-002] Second Issue
Labels: feature

Second issue body";

        let issues = parse_issues(content).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].body, "First issue body");
        assert_eq!(issues[1].labels, vec!["feature"]);
        assert_eq!(issues[1].body, "Second issue body");
    }

    #[test]
    fn test_multiple_issues_without_separator() {
        let content = "## [ISSUE-001] First Issue
Labels: bug

First issue body

## [ISSUE-002] Second Issue
Labels: feature

Second issue body";

        let issues = parse_issues(content).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].body, "First issue body");
        assert_eq!(issues[1].id, "ISSUE-002");
    }

    #[test]
    fn test_empty_file_has_no_issues() {
        assert!(matches!(parse_issues(""), Err(ParseError::NoIssues)));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let content = "## [ISSUE-001] First Issue

Body 1

## [ISSUE-001] Duplicate ID

Body 2";

        let err = parse_issues(content).unwrap_err();
        assert_eq!(err.to_string(), "duplicate issue ID found: ISSUE-001");
    }

    #[test]
    fn test_invalid_header_reports_line() {
        let content = "## [OK] Fine\n\nbody\n## Invalid Header Format\n";
        let err = parse_issues(content).unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeader { line: 4 }));
    }

    #[test]
    fn test_issue_without_body() {
        let issues = parse_issues("## [A] Only a title\nLabels: x\n").unwrap();
        assert_eq!(issues[0].body, "");
        assert_eq!(issues[0].labels, vec!["x"]);
    }

    #[test]
    fn test_metadata_after_blank_line_is_body() {
        let content = "## [A] Title\n\nDepends: B\n";
        let issues = parse_issues(content).unwrap();
        assert!(issues[0].depends_on.is_empty());
        assert_eq!(issues[0].body, "Depends: B");
    }

    #[test]
    fn test_empty_list_entries_are_dropped() {
        let issues = parse_issues("## [A] Title\nDepends: B, , C,\n").unwrap();
        assert_eq!(issues[0].depends_on, vec!["B", "C"]);
    }

    #[test]
    fn test_text_before_first_header_is_ignored() {
        let content = "Preamble text\n\n## [A] Title\n\nBody";
        let issues = parse_issues(content).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].body, "Body");
    }

    #[test]
    fn test_header_without_opening_bracket() {
        let issues = parse_issues("## A] Title\n").unwrap();
        assert_eq!(issues[0].id, "A");
        assert_eq!(issues[0].title, "Title");
    }

    #[test]
    fn test_body_preserves_inner_indentation() {
        let content = "## [A] Title\n\n  first\n    indented\n";
        let issues = parse_issues(content).unwrap();
        assert_eq!(issues[0].body, "first\n    indented");
    }

    #[test]
    fn test_parse_issues_file_reads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "## [A] From disk").unwrap();
        let issues = parse_issues_file(file.path()).unwrap();
        assert_eq!(issues[0].title, "From disk");
    }

    #[test]
    fn test_parse_issues_file_missing() {
        let err = parse_issues_file(Path::new("/nonexistent/issues.md")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}

//! Human-readable relationship summaries.

use std::collections::HashMap;

use crate::domain::{Issue, Relation};

fn clause_label(relation: Relation) -> &'static str {
    match relation {
        Relation::DependsOn => "Depends on",
        Relation::Blocks => "Blocks",
        Relation::Related => "Related",
    }
}

/// Summarise an issue's relationships on one line.
///
/// Produces `Depends on: [B C], Blocks: [D], Related: [E]`, omitting empty
/// clauses. Returns an empty string when the issue has no relationships.
pub fn describe_dependencies(issue: &Issue) -> String {
    Relation::ALL
        .iter()
        .filter(|relation| !issue.relations(**relation).is_empty())
        .map(|relation| {
            format!(
                "{}: [{}]",
                clause_label(*relation),
                issue.relations(*relation).join(" ")
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the dependency comment posted on an issue once the whole batch
/// has been created.
///
/// Only IDs that received a remote number are listed. Returns `None` when no
/// line would be rendered.
pub fn dependency_comment(issue: &Issue, numbers: &HashMap<String, u64>) -> Option<String> {
    let lines: Vec<String> = Relation::ALL
        .iter()
        .filter_map(|relation| {
            let refs: Vec<String> = issue
                .relations(*relation)
                .iter()
                .filter_map(|id| numbers.get(id))
                .map(|number| format!("#{}", number))
                .collect();
            if refs.is_empty() {
                None
            } else {
                Some(format!(
                    "**{}:** {}",
                    clause_label(*relation),
                    refs.join(", ")
                ))
            }
        })
        .collect();

    if lines.is_empty() {
        return None;
    }

    Some(format!("## Dependencies\n\n{}", lines.join("\n")))
}

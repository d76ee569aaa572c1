//! Core domain types for issue batches.
//!
//! An [`Issue`] is one unit of work read from a batch file. Its identity is a
//! caller-supplied string ID, unique within a single batch. Cross-references
//! between issues come in three flavours (see [`Relation`]); only
//! `depends_on` and `blocks` influence creation order.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::graph::GraphNode;

/// Kind of cross-reference between two issues in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// The issue must be created after the referenced issue.
    DependsOn,
    /// The issue must be created before the referenced issue.
    Blocks,
    /// Informational only; no ordering effect.
    Related,
}

impl Relation {
    /// All relation kinds in the order they are checked and rendered.
    pub const ALL: [Relation; 3] = [Relation::DependsOn, Relation::Blocks, Relation::Related];
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            Relation::DependsOn => "depends on",
            Relation::Blocks => "blocks",
            Relation::Related => "relates to",
        };
        f.write_str(phrase)
    }
}

/// A single issue in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Batch-local identifier from the input file.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    /// IDs of issues this one depends on.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// IDs of issues this one blocks.
    #[serde(default)]
    pub blocks: Vec<String>,
    /// IDs of related issues.
    #[serde(default)]
    pub related: Vec<String>,
    /// Remote issue number, assigned by a client after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
}

impl Issue {
    /// Create an issue with the given ID and title and no relationships.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: String::new(),
            labels: Vec::new(),
            assignees: Vec::new(),
            depends_on: Vec::new(),
            blocks: Vec::new(),
            related: Vec::new(),
            number: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_assignees<I, S>(mut self, assignees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assignees = assignees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_blocks<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_related<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related = ids.into_iter().map(Into::into).collect();
        self
    }

    /// IDs referenced through the given relation, in file order.
    pub fn relations(&self, relation: Relation) -> &[String] {
        match relation {
            Relation::DependsOn => &self.depends_on,
            Relation::Blocks => &self.blocks,
            Relation::Related => &self.related,
        }
    }

    /// Whether the issue references any other issue at all.
    pub fn has_relations(&self) -> bool {
        !(self.depends_on.is_empty() && self.blocks.is_empty() && self.related.is_empty())
    }
}

impl GraphNode for Issue {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    fn blocks(&self) -> &[String] {
        &self.blocks
    }

    fn related(&self) -> &[String] {
        &self.related
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_display_phrases() {
        assert_eq!(Relation::DependsOn.to_string(), "depends on");
        assert_eq!(Relation::Blocks.to_string(), "blocks");
        assert_eq!(Relation::Related.to_string(), "relates to");
    }

    #[test]
    fn test_relations_accessor_maps_each_list() {
        let issue = Issue::new("A", "Alpha")
            .with_depends_on(["B"])
            .with_blocks(["C", "D"])
            .with_related(["E"]);

        assert_eq!(issue.relations(Relation::DependsOn), ["B"]);
        assert_eq!(issue.relations(Relation::Blocks), ["C", "D"]);
        assert_eq!(issue.relations(Relation::Related), ["E"]);
        assert!(issue.has_relations());
    }

    #[test]
    fn test_new_issue_has_no_relations() {
        let issue = Issue::new("A", "Alpha");
        assert!(!issue.has_relations());
        assert_eq!(issue.number, None);
    }

    #[test]
    fn test_issue_json_omits_unassigned_number() {
        let issue = Issue::new("A", "Alpha").with_labels(["bug"]);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["id"], "A");
        assert_eq!(json["labels"][0], "bug");
        assert!(json.get("number").is_none());
    }
}

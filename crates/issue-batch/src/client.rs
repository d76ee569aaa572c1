//! Client boundary for creating issues in a remote tracker.
//!
//! Every client can create issues. Label management and dependency comments
//! are optional capabilities: a client advertises them by overriding
//! [`IssueClient::as_label_client`] or [`IssueClient::as_dependency_client`].
//! Callers query for a capability and skip the step when it is absent.

use anyhow::{anyhow, Result};
use std::collections::{BTreeSet, HashSet};

use crate::domain::Issue;
use crate::labels::LabelSpec;

/// Minimal interface every issue client implements.
pub trait IssueClient {
    /// Create `issue` remotely and return its assigned number.
    fn create_issue(&mut self, issue: &Issue) -> Result<u64>;

    /// Repository owner and name.
    fn repository(&self) -> (&str, &str);

    /// Label operations, if supported.
    fn as_label_client(&mut self) -> Option<&mut dyn LabelClient> {
        None
    }

    /// Dependency comment operations, if supported.
    fn as_dependency_client(&mut self) -> Option<&mut dyn DependencyClient> {
        None
    }
}

/// Optional capability: inspect and create labels.
pub trait LabelClient {
    fn label_exists(&mut self, name: &str) -> Result<bool>;

    fn create_label(&mut self, label: &LabelSpec) -> Result<()>;
}

/// Optional capability: post follow-up comments on created issues.
pub trait DependencyClient {
    fn add_comment(&mut self, number: u64, body: &str) -> Result<()>;
}

/// Web URL of an issue on GitHub.
pub fn issue_url(owner: &str, repo: &str, number: u64) -> String {
    format!("https://github.com/{}/{}/issues/{}", owner, repo, number)
}

/// First number handed out by [`MemoryClient`] and by dry runs.
pub const FIRST_OFFLINE_NUMBER: u64 = 1000;

/// In-memory client that records every call.
///
/// Supports both optional capabilities. Used for offline runs and tests;
/// failures can be injected per issue ID or label name.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    owner: String,
    name: String,
    next_number: u64,
    existing_labels: BTreeSet<String>,
    failing_issues: HashSet<String>,
    failing_labels: HashSet<String>,
    created: Vec<(String, u64)>,
    created_labels: Vec<LabelSpec>,
    comments: Vec<(u64, String)>,
}

impl MemoryClient {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            next_number: FIRST_OFFLINE_NUMBER,
            existing_labels: BTreeSet::new(),
            failing_issues: HashSet::new(),
            failing_labels: HashSet::new(),
            created: Vec::new(),
            created_labels: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Pretend `label` already exists remotely.
    pub fn with_existing_label(mut self, label: impl Into<String>) -> Self {
        self.existing_labels.insert(label.into());
        self
    }

    /// Make creation of the issue with this ID fail.
    pub fn with_failing_issue(mut self, id: impl Into<String>) -> Self {
        self.failing_issues.insert(id.into());
        self
    }

    /// Make lookups of this label fail.
    pub fn with_failing_label(mut self, label: impl Into<String>) -> Self {
        self.failing_labels.insert(label.into());
        self
    }

    /// Issue IDs and numbers, in creation order.
    pub fn created(&self) -> &[(String, u64)] {
        &self.created
    }

    pub fn created_labels(&self) -> &[LabelSpec] {
        &self.created_labels
    }

    /// Posted comments as (issue number, body).
    pub fn comments(&self) -> &[(u64, String)] {
        &self.comments
    }
}

impl IssueClient for MemoryClient {
    fn create_issue(&mut self, issue: &Issue) -> Result<u64> {
        if self.failing_issues.contains(&issue.id) {
            return Err(anyhow!("remote rejected issue {}", issue.id));
        }
        let number = self.next_number;
        self.next_number += 1;
        self.created.push((issue.id.clone(), number));
        Ok(number)
    }

    fn repository(&self) -> (&str, &str) {
        (&self.owner, &self.name)
    }

    fn as_label_client(&mut self) -> Option<&mut dyn LabelClient> {
        Some(self)
    }

    fn as_dependency_client(&mut self) -> Option<&mut dyn DependencyClient> {
        Some(self)
    }
}

impl LabelClient for MemoryClient {
    fn label_exists(&mut self, name: &str) -> Result<bool> {
        if self.failing_labels.contains(name) {
            return Err(anyhow!("label lookup failed for {}", name));
        }
        Ok(self.existing_labels.contains(name))
    }

    fn create_label(&mut self, label: &LabelSpec) -> Result<()> {
        self.existing_labels.insert(label.name.clone());
        self.created_labels.push(label.clone());
        Ok(())
    }
}

impl DependencyClient for MemoryClient {
    fn add_comment(&mut self, number: u64, body: &str) -> Result<()> {
        if !self.created.iter().any(|(_, n)| *n == number) {
            return Err(anyhow!("issue #{} does not exist", number));
        }
        self.comments.push((number, body.to_string()));
        Ok(())
    }
}

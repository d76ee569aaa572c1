//! Batch creation: order a batch and walk it through an issue client.
//!
//! Ordering failures abort the batch before any client call is made. Once
//! creation starts, per-issue failures are collected in the report and the
//! remaining issues are still attempted.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::client::{issue_url, IssueClient, LabelClient, FIRST_OFFLINE_NUMBER};
use crate::config::DEFAULT_BODY_PREVIEW;
use crate::describe::{dependency_comment, describe_dependencies};
use crate::domain::Issue;
use crate::labels::{unique_labels, LabelCatalog};
use crate::order::{order, OrderMode};
use crate::output::OutputContext;

/// Indentation for per-issue detail lines.
const DETAIL_INDENT: &str = "         ";

/// Options controlling a batch run.
#[derive(Debug, Clone, Copy)]
pub struct CreatorOptions {
    /// Report what would happen without calling the client.
    pub dry_run: bool,
    pub mode: OrderMode,
    /// Characters of body text shown in dry-run previews.
    pub body_preview: usize,
}

impl Default for CreatorOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            mode: OrderMode::Dependency,
            body_preview: DEFAULT_BODY_PREVIEW,
        }
    }
}

/// One issue created (or simulated) during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedIssue {
    pub id: String,
    pub title: String,
    pub number: u64,
    pub url: String,
}

/// Outcome of [`Creator::create_issues`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub created: Vec<CreatedIssue>,
    pub errors: Vec<String>,
}

impl BatchReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Outcome of [`Creator::create_labels_only`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabelReport {
    pub total: usize,
    pub created: usize,
    pub existing: usize,
    pub errors: Vec<String>,
}

/// Drives a batch through an [`IssueClient`].
pub struct Creator<C: IssueClient> {
    client: C,
    options: CreatorOptions,
    catalog: LabelCatalog,
    output: OutputContext,
}

impl<C: IssueClient> Creator<C> {
    pub fn new(client: C, options: CreatorOptions) -> Self {
        Self {
            client,
            options,
            catalog: LabelCatalog::default(),
            output: OutputContext::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: LabelCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_output(mut self, output: OutputContext) -> Self {
        self.output = output;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Order the batch and create every issue in that order.
    ///
    /// Returns an error only when no valid order exists; in that case the
    /// client has not been called.
    pub fn create_issues(&mut self, issues: &[Issue]) -> Result<BatchReport> {
        let ordered = order(issues, self.options.mode).with_context(|| match self.options.mode {
            OrderMode::Dependency => "failed to resolve dependencies",
            OrderMode::Original => "failed to validate issue references",
        })?;

        info!(
            issues = ordered.len(),
            mode = %self.options.mode,
            dry_run = self.options.dry_run,
            "starting batch"
        );
        self.output.print_info(format!(
            "Creating {} issues in {}:\n",
            ordered.len(),
            self.options.mode
        ))?;

        let total = ordered.len();
        let mut report = BatchReport::default();
        let mut numbers: HashMap<String, u64> = HashMap::new();

        for (index, issue) in ordered.iter().enumerate() {
            self.output.print_info(format!(
                "[{}/{}] Creating issue: {} - {}",
                index + 1,
                total,
                issue.id,
                issue.title
            ))?;

            if issue.has_relations() {
                self.output.print_info(format!(
                    "{}Dependencies: {}",
                    DETAIL_INDENT,
                    describe_dependencies(issue)
                ))?;
            }

            let number = if self.options.dry_run {
                self.print_preview(issue)?;
                FIRST_OFFLINE_NUMBER + index as u64
            } else {
                if let Some(label_client) = self.client.as_label_client() {
                    if let Err(e) =
                        ensure_labels_exist(label_client, &self.catalog, &issue.labels, &self.output)
                    {
                        warn!(issue = %issue.id, error = %e, "could not ensure labels");
                        self.output
                            .print_warning(format!("Failed to ensure labels exist: {:#}", e))?;
                    }
                }

                match self.client.create_issue(issue) {
                    Ok(number) => number,
                    Err(e) => {
                        warn!(issue = %issue.id, error = %e, "issue creation failed");
                        self.output
                            .print_info(format!("{}ERROR: {:#}", DETAIL_INDENT, e))?;
                        report
                            .errors
                            .push(format!("failed to create issue {}: {:#}", issue.id, e));
                        continue;
                    }
                }
            };

            let (owner, repo) = self.client.repository();
            let url = issue_url(owner, repo, number);
            if !self.options.dry_run {
                self.output
                    .print_info(format!("{}Created: #{} - {}", DETAIL_INDENT, number, url))?;
            }

            numbers.insert(issue.id.clone(), number);
            report.created.push(CreatedIssue {
                id: issue.id.clone(),
                title: issue.title.clone(),
                number,
                url,
            });
            self.output.print_info("")?;
        }

        if !self.options.dry_run {
            self.post_dependency_comments(&ordered, &numbers, &mut report)?;
        }

        info!(
            created = report.created.len(),
            errors = report.errors.len(),
            "batch finished"
        );
        Ok(report)
    }

    fn print_preview(&self, issue: &Issue) -> Result<()> {
        for line in preview_lines(issue, self.options.body_preview) {
            self.output.print_info(format!("{}{}", DETAIL_INDENT, line))?;
        }
        Ok(())
    }

    fn post_dependency_comments(
        &mut self,
        ordered: &[&Issue],
        numbers: &HashMap<String, u64>,
        report: &mut BatchReport,
    ) -> Result<()> {
        let Some(dependency_client) = self.client.as_dependency_client() else {
            return Ok(());
        };

        self.output
            .print_info("Adding dependency information to issues...")?;

        for issue in ordered {
            let Some(&number) = numbers.get(&issue.id) else {
                continue;
            };
            let Some(comment) = dependency_comment(issue, numbers) else {
                continue;
            };
            if let Err(e) = dependency_client.add_comment(number, &comment) {
                warn!(issue = %issue.id, error = %e, "dependency comment failed");
                report.errors.push(format!(
                    "failed to update dependencies for issue {}: {:#}",
                    issue.id, e
                ));
            }
        }

        Ok(())
    }

    /// Create every distinct label used by the batch, without creating issues.
    ///
    /// Requires a client with label support.
    pub fn create_labels_only(&mut self, issues: &[Issue]) -> Result<LabelReport> {
        let label_client = self
            .client
            .as_label_client()
            .ok_or_else(|| anyhow!("the current client does not support label operations"))?;

        let labels = unique_labels(issues);
        let mut report = LabelReport {
            total: labels.len(),
            ..LabelReport::default()
        };

        self.output
            .print_info(format!("Found {} unique labels to process\n", labels.len()))?;

        for (index, label) in labels.iter().enumerate() {
            self.output.print_info(format!(
                "[{}/{}] Processing label: {}",
                index + 1,
                labels.len(),
                label
            ))?;

            if self.options.dry_run {
                self.output.print_info(format!(
                    "{}[DRY RUN] Would check/create label: {}",
                    DETAIL_INDENT, label
                ))?;
                report.created += 1;
                self.output.print_info("")?;
                continue;
            }

            match label_client.label_exists(label) {
                Ok(true) => {
                    self.output
                        .print_info(format!("{}Label already exists", DETAIL_INDENT))?;
                    report.existing += 1;
                }
                Ok(false) => {
                    let spec = self.catalog.resolve(label);
                    match label_client.create_label(&spec) {
                        Ok(()) => {
                            self.output.print_info(format!(
                                "{}Created label with color #{}",
                                DETAIL_INDENT, spec.color
                            ))?;
                            report.created += 1;
                        }
                        Err(e) => {
                            self.output
                                .print_info(format!("{}ERROR: {:#}", DETAIL_INDENT, e))?;
                            report
                                .errors
                                .push(format!("failed to create label {}: {:#}", label, e));
                        }
                    }
                }
                Err(e) => {
                    self.output
                        .print_info(format!("{}ERROR: {:#}", DETAIL_INDENT, e))?;
                    report.errors.push(format!(
                        "failed to check if label {} exists: {:#}",
                        label, e
                    ));
                }
            }
            self.output.print_info("")?;
        }

        info!(
            total = report.total,
            created = report.created,
            existing = report.existing,
            "label pass finished"
        );
        Ok(report)
    }
}

/// Create any of `labels` that do not exist yet. Stops at the first failure.
fn ensure_labels_exist(
    client: &mut dyn LabelClient,
    catalog: &LabelCatalog,
    labels: &[String],
    output: &OutputContext,
) -> Result<()> {
    for label in labels {
        let exists = client
            .label_exists(label)
            .with_context(|| format!("failed to check if label {} exists", label))?;

        if !exists {
            let spec = catalog.resolve(label);
            output.print_info(format!("{}Creating missing label: {}", DETAIL_INDENT, label))?;
            client
                .create_label(&spec)
                .with_context(|| format!("failed to create label {}", label))?;
        }
    }

    Ok(())
}

/// Dry-run description of the issue that would be created.
fn preview_lines(issue: &Issue, body_preview: usize) -> Vec<String> {
    let mut lines = vec![
        "[DRY RUN] Would create issue with:".to_string(),
        format!("- Title: {}", issue.title),
    ];
    if !issue.body.is_empty() {
        lines.push(format!("- Body: {}", truncate(&issue.body, body_preview)));
    }
    if !issue.labels.is_empty() {
        lines.push(format!("- Labels: [{}]", issue.labels.join(" ")));
    }
    if !issue.assignees.is_empty() {
        lines.push(format!("- Assignees: [{}]", issue.assignees.join(" ")));
    }
    lines
}

/// Shorten `s` to at most `max_chars` characters, appending `...` if cut.
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &s[..byte_index]),
        None => s.to_string(),
    }
}

//! Issue Batch Planner
//!
//! Validates a batch file of linked issues, prints a dependency-respecting
//! creation order, and walks the batch through a dry run of creation.

use anyhow::{bail, Context, Result};
use clap::Parser;
use issue_batch::cli::{Cli, Commands};
use issue_batch::config::{parse_repository, BatchConfig};
use issue_batch::creator::{Creator, CreatorOptions};
use issue_batch::describe::describe_dependencies;
use issue_batch::labels::{unique_labels, LabelCatalog, LabelSpec};
use issue_batch::order::{order, OrderMode};
use issue_batch::output::{ExitCode, JsonError, JsonOutput, OutputContext};
use issue_batch::{parse_issues_file, DependencyGraph, Issue, MemoryClient};
use serde::Serialize;
use serde_json::json;
use std::env;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Repository used when neither `--repo` nor the config names one.
const DEFAULT_REPOSITORY: &str = "owner/repo";

fn main() {
    init_tracing();

    let exit_code = match run() {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            let _ = OutputContext::default().print_error(format!("{:#}", e));
            ExitCode::from_error(&e)
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ISSUE_BATCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("issue_batch=warn"));

    let format = env::var("ISSUE_BATCH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    let current_dir = env::current_dir()?;
    let config = BatchConfig::discover(cli.config.as_deref(), &current_dir)?;
    let repository = cli
        .repo
        .as_deref()
        .or(config.repository())
        .unwrap_or(DEFAULT_REPOSITORY)
        .to_string();

    match cli.command {
        Commands::Validate { file, json } => {
            let output = OutputContext::new(quiet, json);
            with_json_error(json, "validate", validate(&file, output))
        }
        Commands::Order {
            file,
            no_sort,
            json,
        } => {
            let output = OutputContext::new(quiet, json);
            let mode = order_mode(no_sort, &config);
            with_json_error(json, "order", print_order(&file, mode, output))
        }
        Commands::Plan {
            file,
            no_sort,
            json,
        } => {
            let output = OutputContext::new(quiet, json);
            let options = CreatorOptions {
                dry_run: true,
                mode: order_mode(no_sort, &config),
                body_preview: config.body_preview(),
            };
            let result = config
                .label_catalog()
                .and_then(|catalog| plan(&file, &repository, options, catalog, output));
            with_json_error(json, "plan", result)
        }
        Commands::Labels { file, json } => {
            let output = OutputContext::new(quiet, json);
            let options = CreatorOptions {
                dry_run: true,
                ..CreatorOptions::default()
            };
            let result = config
                .label_catalog()
                .and_then(|catalog| plan_labels(&file, &repository, options, catalog, output));
            with_json_error(json, "labels", result)
        }
    }
}

/// `--no-sort` wins over the configured mode.
fn order_mode(no_sort: bool, config: &BatchConfig) -> OrderMode {
    if no_sort {
        OrderMode::Original
    } else {
        config.order_mode()
    }
}

/// Print a JSON error document before handing the error back to `main`.
fn with_json_error(json: bool, command: &str, result: Result<()>) -> Result<()> {
    if json {
        if let Err(e) = &result {
            println!("{}", JsonError::from_error(e, command).to_json_string()?);
        }
    }
    result
}

fn memory_client(repository: &str) -> Result<MemoryClient> {
    let (owner, name) = parse_repository(repository)?;
    Ok(MemoryClient::new(owner, name))
}

/// A root issue and the issues that directly depend on it.
#[derive(Serialize)]
struct RootIssue<'a> {
    id: &'a str,
    dependents: Vec<&'a str>,
}

fn validate(file: &Path, output: OutputContext) -> Result<()> {
    let issues = parse_issues_file(file)?;
    let refs: Vec<&Issue> = issues.iter().collect();
    let graph = DependencyGraph::new(&refs)?;
    graph
        .validate()
        .with_context(|| format!("{} failed validation", file.display()))?;

    let roots = graph.get_roots();

    if output.is_json() {
        let roots: Vec<RootIssue> = roots
            .iter()
            .map(|root| RootIssue {
                id: &root.id,
                dependents: graph
                    .get_dependents(&root.id)
                    .into_iter()
                    .map(|dependent| dependent.id.as_str())
                    .collect(),
            })
            .collect();
        let data = json!({
            "valid": true,
            "issues": issues.len(),
            "roots": roots,
        });
        println!("{}", JsonOutput::success(data, "validate").to_json_string()?);
    } else {
        output.print_data(format!(
            "{} issues valid: all references resolve, no dependency cycles",
            issues.len()
        ))?;
        let ids: Vec<&str> = roots.iter().map(|root| root.id.as_str()).collect();
        output.print_info(format!("Roots: {}", ids.join(", ")))?;
    }

    Ok(())
}

#[derive(Serialize)]
struct OrderedIssue<'a> {
    position: usize,
    id: &'a str,
    title: &'a str,
    depends_on: &'a [String],
    blocks: &'a [String],
    related: &'a [String],
}

fn print_order(file: &Path, mode: OrderMode, output: OutputContext) -> Result<()> {
    let issues = parse_issues_file(file)?;
    let ordered = order(&issues, mode)
        .with_context(|| format!("failed to order issues in {}", file.display()))?;

    if output.is_json() {
        let entries: Vec<OrderedIssue> = ordered
            .iter()
            .enumerate()
            .map(|(i, issue)| OrderedIssue {
                position: i + 1,
                id: &issue.id,
                title: &issue.title,
                depends_on: &issue.depends_on,
                blocks: &issue.blocks,
                related: &issue.related,
            })
            .collect();
        let data = json!({ "mode": mode, "issues": entries });
        println!("{}", JsonOutput::success(data, "order").to_json_string()?);
        return Ok(());
    }

    output.print_info(format!("Creation order ({}):\n", mode))?;
    for (i, issue) in ordered.iter().enumerate() {
        output.print_data(format!("{}. {} - {}", i + 1, issue.id, issue.title))?;
        let dependencies = describe_dependencies(issue);
        if !dependencies.is_empty() {
            output.print_data(format!("   {}", dependencies))?;
        }
    }

    Ok(())
}

fn plan(
    file: &Path,
    repository: &str,
    options: CreatorOptions,
    catalog: LabelCatalog,
    output: OutputContext,
) -> Result<()> {
    let issues = parse_issues_file(file)?;
    let mut creator = Creator::new(memory_client(repository)?, options)
        .with_catalog(catalog)
        .with_output(output);

    let report = creator.create_issues(&issues)?;

    if output.is_json() {
        println!("{}", JsonOutput::success(&report, "plan").to_json_string()?);
    } else {
        output.print_data(format!(
            "Dry run complete: {} issues would be created",
            report.created.len()
        ))?;
    }

    if report.has_errors() {
        bail!("{} issues failed", report.errors.len());
    }
    Ok(())
}

fn plan_labels(
    file: &Path,
    repository: &str,
    options: CreatorOptions,
    catalog: LabelCatalog,
    output: OutputContext,
) -> Result<()> {
    let issues = parse_issues_file(file)?;
    let labels: Vec<LabelSpec> = unique_labels(&issues)
        .iter()
        .map(|name| catalog.resolve(name))
        .collect();

    let mut creator = Creator::new(memory_client(repository)?, options)
        .with_catalog(catalog)
        .with_output(output);
    let report = creator.create_labels_only(&issues)?;

    if output.is_json() {
        let data = json!({ "report": report, "labels": labels });
        println!("{}", JsonOutput::success(data, "labels").to_json_string()?);
        return Ok(());
    }

    for label in &labels {
        output.print_data(format!(
            "{} #{} {}",
            label.name, label.color, label.description
        ))?;
    }

    if !report.errors.is_empty() {
        bail!("{} labels failed", report.errors.len());
    }
    Ok(())
}

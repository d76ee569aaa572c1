//! Command-line interface definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::parse_repository;

fn repository_arg(value: &str) -> Result<String, String> {
    parse_repository(value)
        .map(|_| value.to_string())
        .map_err(|e| e.to_string())
}

/// Issue batch planner
///
/// Reads a batch of cross-referenced issues from a markdown file, checks that
/// every reference resolves and that `Depends` links form no cycle, and
/// computes a creation order that keeps file order wherever dependencies
/// allow it.
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred (including per-issue creation failures)
///   2  - Invalid arguments or usage error
///   3  - Input or config file not found
///   4  - Validation failed (cycle detected, broken references, bad format)
#[derive(Parser)]
#[command(name = "issue-batch")]
#[command(about = "Validate, order and plan batches of linked issues", long_about = None)]
pub struct Cli {
    /// Suppress non-essential output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: .issue-batch.toml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Target repository as owner/name (default: config, then owner/repo)
    #[arg(long, global = true, value_parser = repository_arg)]
    pub repo: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check references and dependency cycles without ordering
    ///
    /// Examples:
    ///   issue-batch validate --file issues.md
    ///   issue-batch validate -f issues.md --json
    Validate {
        /// Issue batch file
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Print the creation order with each issue's relationships
    ///
    /// Dependencies are created before their dependents; otherwise file order
    /// is kept.
    Order {
        /// Issue batch file
        #[arg(short, long)]
        file: PathBuf,

        /// Keep file order (only references are checked)
        #[arg(long)]
        no_sort: bool,

        #[arg(long)]
        json: bool,
    },

    /// Walk the batch through a dry run of issue creation
    Plan {
        /// Issue batch file
        #[arg(short, long)]
        file: PathBuf,

        /// Keep file order (only references are checked)
        #[arg(long)]
        no_sort: bool,

        #[arg(long)]
        json: bool,
    },

    /// Dry run of creating every label used by the batch
    Labels {
        /// Issue batch file
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_order_with_global_flags() {
        let cli = Cli::try_parse_from([
            "issue-batch",
            "order",
            "-f",
            "issues.md",
            "--no-sort",
            "--quiet",
            "--repo",
            "acme/widgets",
        ])
        .unwrap();

        assert!(cli.quiet);
        assert_eq!(cli.repo.as_deref(), Some("acme/widgets"));
        match cli.command {
            Commands::Order {
                file,
                no_sort,
                json,
            } => {
                assert_eq!(file, PathBuf::from("issues.md"));
                assert!(no_sort);
                assert!(!json);
            }
            _ => panic!("expected order command"),
        }
    }

    #[test]
    fn test_malformed_repo_rejected() {
        let result = Cli::try_parse_from([
            "issue-batch",
            "validate",
            "-f",
            "issues.md",
            "--repo",
            "widgets",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_file_is_required() {
        assert!(Cli::try_parse_from(["issue-batch", "validate"]).is_err());
    }
}

//! Issue Batch Library
//!
//! Dependency-aware validation and ordering for batches of cross-referenced
//! issues, plus the parser, label catalog and creation workflow built on it.
//! The ordering core performs no I/O and can be embedded in other tools.

pub mod cli;
pub mod client;
pub mod config;
pub mod creator;
pub mod describe;
pub mod domain;
pub mod graph;
pub mod labels;
pub mod order;
pub mod output;
pub mod parser;

// Re-export commonly used types
pub use client::{IssueClient, MemoryClient};
pub use creator::{BatchReport, Creator, CreatorOptions};
pub use describe::describe_dependencies;
pub use domain::{Issue, Relation};
pub use graph::{DependencyGraph, GraphError, GraphNode};
pub use order::{creation_order, original_order, OrderMode};
pub use output::{ExitCode, JsonError, JsonOutput, OutputContext};
pub use parser::{parse_issues, parse_issues_file, ParseError};

//! Structured output formatting for CLI commands.
//!
//! This module provides quiet-aware progress output plus consistent JSON
//! output for both success and error cases, so batch plans can be consumed
//! by scripts.

use chrono::Utc;
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::io::{self, Write};

use crate::graph::GraphError;
use crate::parser::ParseError;

/// Version of the JSON output format
const OUTPUT_VERSION: &str = "0.1.0";

// ============================================================================
// Output Context for Quiet Mode
// ============================================================================

/// Context for controlling output verbosity
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputContext {
    quiet: bool,
    json: bool,
}

impl OutputContext {
    /// Create a new output context
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    /// Print essential output (always shown unless --json)
    pub fn print_data(&self, msg: impl Display) -> io::Result<()> {
        if !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print informational message (suppressed by --quiet or --json)
    pub fn print_info(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print warning (suppressed by --quiet or --json)
    pub fn print_warning(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe_stderr(&format!("Warning: {}", msg))
        } else {
            Ok(())
        }
    }

    /// Print error (always shown to stderr)
    pub fn print_error(&self, msg: impl Display) -> io::Result<()> {
        writeln_safe_stderr(&format!("Error: {}", msg))
    }

    /// Check if JSON mode is enabled
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Safe println that handles broken pipes gracefully
fn writeln_safe(msg: &str) -> io::Result<()> {
    match writeln!(io::stdout(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            // Silently exit on broken pipe (expected when piping to head, etc.)
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

/// Safe eprintln that handles broken pipes gracefully
fn writeln_safe_stderr(msg: &str) -> io::Result<()> {
    match writeln!(io::stderr(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

// ============================================================================
// JSON Output Types
// ============================================================================

/// Wrapper for successful command output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub metadata: Metadata,
}

impl<T: Serialize> JsonOutput<T> {
    /// Create a new successful output with the given data
    pub fn success(data: T, command: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            metadata: Metadata::new(command),
        }
    }

    /// Serialize to JSON string with pretty formatting
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Wrapper for error output
#[derive(Debug, Serialize)]
pub struct JsonError {
    pub success: bool,
    pub error: ErrorDetail,
    pub metadata: Metadata,
}

impl JsonError {
    /// Create a new error output
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
            metadata: Metadata::new(command),
        }
    }

    /// Build an error output from any error, classifying it by cause.
    pub fn from_error(error: &anyhow::Error, command: impl Into<String>) -> Self {
        Self::new(ErrorCode::classify(error), format!("{:#}", error), command)
    }

    /// Serialize to JSON string with pretty formatting
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Error code and message
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code (e.g., "MISSING_REFERENCE", "CIRCULAR_DEPENDENCY")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Metadata included in all responses
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// Timestamp when the response was generated
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: chrono::DateTime<Utc>,
    /// Version of the output format
    pub version: String,
    /// Command that generated this response
    pub command: String,
}

impl Metadata {
    fn new(command: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            version: OUTPUT_VERSION.to_string(),
            command: command.into(),
        }
    }
}

/// Serialize timestamp in ISO 8601 format
fn serialize_timestamp<S>(dt: &chrono::DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

// ============================================================================
// Exit Codes
// ============================================================================

/// Standardized exit codes for the issue-batch CLI
///
/// # Examples
///
/// ```rust
/// use issue_batch::ExitCode;
///
/// assert_eq!(ExitCode::ValidationFailed.code(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded (0)
    Success = 0,

    /// Generic error, including per-issue creation failures (1)
    GenericError = 1,

    /// Invalid arguments or usage error (2)
    InvalidArgument = 2,

    /// Input or config file not found (3)
    NotFound = 3,

    /// Validation failed - broken references, cycles, bad file format (4)
    ValidationFailed = 4,
}

impl ExitCode {
    /// Convert exit code to i32 for `std::process::exit`
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Pick the exit code for an error by inspecting its cause chain.
    pub fn from_error(error: &anyhow::Error) -> Self {
        for cause in error.chain() {
            if cause.is::<GraphError>() {
                return ExitCode::ValidationFailed;
            }
            if let Some(parse_error) = cause.downcast_ref::<ParseError>() {
                return match parse_error {
                    ParseError::Io { source, .. }
                        if source.kind() == io::ErrorKind::NotFound =>
                    {
                        ExitCode::NotFound
                    }
                    ParseError::Io { .. } => ExitCode::GenericError,
                    _ => ExitCode::ValidationFailed,
                };
            }
            if let Some(io_error) = cause.downcast_ref::<io::Error>() {
                if io_error.kind() == io::ErrorKind::NotFound {
                    return ExitCode::NotFound;
                }
            }
        }
        ExitCode::GenericError
    }
}

// ============================================================================
// Error Codes (String constants for JSON responses)
// ============================================================================

/// Standard error codes for JSON responses
pub struct ErrorCode;

impl ErrorCode {
    pub const MISSING_REFERENCE: &'static str = "MISSING_REFERENCE";
    pub const CIRCULAR_DEPENDENCY: &'static str = "CIRCULAR_DEPENDENCY";
    pub const UNRESOLVABLE_GRAPH: &'static str = "UNRESOLVABLE_GRAPH";
    pub const DUPLICATE_ID: &'static str = "DUPLICATE_ID";
    pub const PARSE_ERROR: &'static str = "PARSE_ERROR";
    pub const FILE_NOT_FOUND: &'static str = "FILE_NOT_FOUND";
    pub const INTERNAL_ERROR: &'static str = "INTERNAL_ERROR";

    /// Map an error to its JSON error code by inspecting its cause chain.
    pub fn classify(error: &anyhow::Error) -> &'static str {
        for cause in error.chain() {
            if let Some(graph_error) = cause.downcast_ref::<GraphError>() {
                return match graph_error {
                    GraphError::MissingReference { .. } => Self::MISSING_REFERENCE,
                    GraphError::CircularDependency { .. } => Self::CIRCULAR_DEPENDENCY,
                    GraphError::UnresolvableGraph { .. } => Self::UNRESOLVABLE_GRAPH,
                    GraphError::DuplicateId { .. } => Self::DUPLICATE_ID,
                };
            }
            if let Some(parse_error) = cause.downcast_ref::<ParseError>() {
                return match parse_error {
                    ParseError::Io { source, .. }
                        if source.kind() == io::ErrorKind::NotFound =>
                    {
                        Self::FILE_NOT_FOUND
                    }
                    ParseError::Io { .. } => Self::INTERNAL_ERROR,
                    ParseError::DuplicateId { .. } => Self::DUPLICATE_ID,
                    _ => Self::PARSE_ERROR,
                };
            }
        }
        Self::INTERNAL_ERROR
    }
}

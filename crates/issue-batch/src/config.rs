//! Configuration file loading and parsing.
//!
//! issue-batch reads optional settings from `.issue-batch.toml` in the working
//! directory, or from an explicit `--config` path. If no config file exists,
//! the system falls back to sensible defaults. Command-line flags override
//! anything set here.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::labels::LabelCatalog;
use crate::order::OrderMode;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".issue-batch.toml";

/// Default number of body characters shown in dry-run previews.
pub const DEFAULT_BODY_PREVIEW: usize = 100;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchConfig {
    /// Ordering behaviour (optional).
    pub ordering: Option<OrderingConfig>,
    /// Progress output settings (optional).
    pub output: Option<OutputConfig>,
    /// Target repository (optional).
    pub repository: Option<RepositoryConfig>,
    /// Label definitions keyed by label name (optional).
    pub labels: Option<HashMap<String, LabelConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderingConfig {
    /// "dependency" (default) or "original".
    pub mode: Option<OrderMode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Characters of body text shown in dry-run previews (default: 100).
    pub body_preview: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryConfig {
    /// Repository in `owner/name` form.
    pub name: Option<String>,
}

/// Definition for a label created on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LabelConfig {
    pub description: Option<String>,
    /// Six hex digits, no leading `#`.
    pub color: Option<String>,
}

impl BatchConfig {
    /// Load configuration from a specific file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: BatchConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Load the explicit config file if given, otherwise `.issue-batch.toml`
    /// in `dir` if it exists.
    ///
    /// Returns an empty config (all fields None) when neither is present.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let default_path = dir.join(CONFIG_FILE_NAME);
        if !default_path.exists() {
            return Ok(BatchConfig::default());
        }

        Self::load(&default_path)
    }

    /// Get ordering mode with default fallback.
    pub fn order_mode(&self) -> OrderMode {
        self.ordering
            .as_ref()
            .and_then(|o| o.mode)
            .unwrap_or_default()
    }

    /// Get body preview length with default fallback.
    pub fn body_preview(&self) -> usize {
        self.output
            .as_ref()
            .and_then(|o| o.body_preview)
            .unwrap_or(DEFAULT_BODY_PREVIEW)
    }

    /// Configured repository name, if any.
    pub fn repository(&self) -> Option<&str> {
        self.repository.as_ref().and_then(|r| r.name.as_deref())
    }

    /// Build the label catalog from configured definitions.
    pub fn label_catalog(&self) -> Result<LabelCatalog> {
        LabelCatalog::new(self.labels.clone().unwrap_or_default())
    }
}

/// Split an `owner/name` repository string.
pub fn parse_repository(repo: &str) -> Result<(String, String)> {
    match repo.split_once('/') {
        Some((owner, name))
            if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
        {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(anyhow!(
            "Invalid repository '{}': expected 'owner/name'",
            repo
        )),
    }
}

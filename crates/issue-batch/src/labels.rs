//! Label catalog for batch creation.
//!
//! Labels referenced by issues may not exist in the target repository yet.
//! This module decides the description and colour used when creating them:
//! configured definitions win, then the built-in catalog, then a generic
//! grey fallback.

use anyhow::{anyhow, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use crate::config::LabelConfig;
use crate::domain::Issue;

/// Colour used for labels with no known definition.
pub const FALLBACK_COLOR: &str = "cccccc";

/// Regex for label colours: six hex digits, no leading `#`.
static COLOR_REGEX: OnceLock<Regex> = OnceLock::new();

fn color_regex() -> &'static Regex {
    COLOR_REGEX.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{6}$").expect("Color regex should compile"))
}

const BUILTIN_LABELS: &[(&str, &str, &str)] = &[
    ("epic", "Epic issue", "d73a4a"),
    ("priority-high", "High priority issue", "b60205"),
    ("priority-medium", "Medium priority issue", "fbca04"),
    ("priority-low", "Low priority issue", "0e8a16"),
    ("setup", "Project setup", "7057ff"),
    ("foundation", "Foundation implementation", "006b75"),
    ("config", "Configuration implementation", "fef2c0"),
    ("provider", "Service provider implementation", "c2e0c6"),
    ("template", "Template implementation", "e99695"),
    ("engine", "Engine implementation", "f7c6c7"),
    ("command", "Command implementation", "c5def5"),
    ("init", "Initialization command", "bfd4f2"),
    ("entity", "Entity related", "d4c5f9"),
    ("generator", "Code generator", "fbca04"),
    ("feature", "New feature", "a2eeef"),
    ("bug", "Bug fix", "d73a4a"),
    ("enhancement", "Enhancement", "84b6eb"),
    ("documentation", "Documentation", "0075ca"),
    ("testing", "Testing related", "d4edda"),
];

/// Description and colour to use when creating a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSpec {
    pub name: String,
    pub description: String,
    pub color: String,
}

/// Validate a label colour
///
/// # Examples
///
/// ```
/// use issue_batch::labels::validate_color;
///
/// assert!(validate_color("d73a4a").is_ok());
/// assert!(validate_color("#d73a4a").is_err());
/// assert!(validate_color("red").is_err());
/// ```
pub fn validate_color(color: &str) -> Result<()> {
    if !color_regex().is_match(color) {
        let mut msg = format!(
            "Invalid label color: '{}'. Expected six hex digits like 'd73a4a'",
            color
        );
        if let Some(stripped) = color.strip_prefix('#') {
            msg.push_str(&format!(". Did you mean '{}'?", stripped));
        }
        return Err(anyhow!(msg));
    }
    Ok(())
}

/// Resolves label definitions from configuration and the built-in catalog.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    overrides: HashMap<String, LabelConfig>,
}

impl LabelCatalog {
    /// Build a catalog, rejecting configured labels with malformed colours.
    ///
    /// Labels are checked in name order, so the first bad colour reported is
    /// stable across runs.
    pub fn new(overrides: HashMap<String, LabelConfig>) -> Result<Self> {
        let mut names: Vec<&String> = overrides.keys().collect();
        names.sort();
        for name in names {
            if let Some(color) = &overrides[name].color {
                validate_color(color).map_err(|e| anyhow!("label '{}': {}", name, e))?;
            }
        }
        Ok(Self { overrides })
    }

    /// Look up the definition for `name`.
    pub fn resolve(&self, name: &str) -> LabelSpec {
        let builtin = BUILTIN_LABELS
            .iter()
            .find(|(label, _, _)| *label == name)
            .map(|(_, description, color)| (description.to_string(), color.to_string()));
        let configured = self.overrides.get(name);

        let description = configured
            .and_then(|c| c.description.clone())
            .or_else(|| builtin.as_ref().map(|(d, _)| d.clone()))
            .unwrap_or_else(|| format!("Label: {}", name));
        let color = configured
            .and_then(|c| c.color.clone())
            .or_else(|| builtin.as_ref().map(|(_, c)| c.clone()))
            .unwrap_or_else(|| FALLBACK_COLOR.to_string());

        LabelSpec {
            name: name.to_string(),
            description,
            color,
        }
    }
}

/// All distinct labels used by a batch, sorted by name.
pub fn unique_labels(issues: &[Issue]) -> Vec<String> {
    issues
        .iter()
        .flat_map(|issue| issue.labels.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

//! Loader and renderer settings, usually read from a YAML file.
//!
//! ```yaml
//! base_path: static/tips/
//! template_sets: [base, forbidden-js]
//! marker_class: error-msg
//! fetch_timeout_ms: 5000
//! duplicate_policy: reject
//! strict_fields: true
//! ```

use crate::engine::MustacheEngine;
use crate::registry::{DuplicatePolicy, TemplateRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default class marking an element as an error-message template.
pub const DEFAULT_MARKER_CLASS: &str = "error-msg";

/// Errors produced while reading a [`TipsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    /// Reading the file failed.
    Io(#[from] std::io::Error),
}

/// Settings for loading and rendering error templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TipsConfig {
    /// Prefix for template-set resources; should end with a separator.
    pub base_path: String,
    /// Template sets to load at startup.
    pub template_sets: Vec<String>,
    /// Class marking template elements inside a resource.
    pub marker_class: String,
    /// Per-load fetch timeout in milliseconds; unset means wait forever.
    pub fetch_timeout_ms: Option<u64>,
    /// How the registry treats duplicate error types.
    pub duplicate_policy: DuplicatePolicy,
    /// Fail renders that reference missing record fields.
    pub strict_fields: bool,
}

impl Default for TipsConfig {
    fn default() -> Self {
        Self {
            base_path: "templates/".to_string(),
            template_sets: Vec::new(),
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
            fetch_timeout_ms: None,
            duplicate_policy: DuplicatePolicy::default(),
            strict_fields: false,
        }
    }
}

impl TipsConfig {
    /// Parse a config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read a config from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// The fetch timeout as a [`Duration`].
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    /// An empty registry using the configured duplicate policy.
    pub fn registry(&self) -> TemplateRegistry {
        TemplateRegistry::with_policy(self.duplicate_policy)
    }

    /// The templating engine matching `strict_fields`.
    pub fn engine(&self) -> MustacheEngine {
        MustacheEngine::new().with_strict(self.strict_fields)
    }
}

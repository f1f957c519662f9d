//! Where template-set resources come from.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while fetching a template-set resource.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("template resource not found: {path}")]
    /// Nothing exists at the path.
    NotFound {
        /// The requested path.
        path: String,
    },

    #[error("failed to read template resource {path}: {source}")]
    /// The resource exists but could not be read.
    Io {
        /// The requested path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    #[error("template resource {path} did not settle within {after:?}")]
    /// The fetch exceeded the loader's timeout.
    TimedOut {
        /// The requested path.
        path: String,
        /// The timeout that elapsed.
        after: Duration,
    },
}

/// Fetch a resource by path, producing its text or a failure.
pub trait TemplateSource: Send + Sync {
    /// Fetch the resource at `path`.
    fn fetch(&self, path: &str) -> Result<String, FetchError>;
}

/// Resource path for the template set `name` under `base_path`.
///
/// This is plain concatenation: `base_path` is expected to end with a separator.
pub fn template_set_path(base_path: &str, name: &str) -> String {
    format!("{base_path}errors.{name}.html")
}

/// Reads template sets from the filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsTemplateSource {
    root: Option<PathBuf>,
}

impl FsTemplateSource {
    /// Resolve paths relative to the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve paths relative to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        }
    }
}

impl TemplateSource for FsTemplateSource {
    fn fetch(&self, path: &str) -> Result<String, FetchError> {
        std::fs::read_to_string(self.resolve(path)).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                FetchError::NotFound {
                    path: path.to_string(),
                }
            } else {
                FetchError::Io {
                    path: path.to_string(),
                    source,
                }
            }
        })
    }
}

/// Serves template sets from memory (embedded templates, tests).
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateSource {
    resources: HashMap<String, String>,
}

impl MemoryTemplateSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource at `path`.
    pub fn insert(&mut self, path: impl Into<String>, body: impl Into<String>) {
        self.resources.insert(path.into(), body.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_resource(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(path, body);
        self
    }
}

impl TemplateSource for MemoryTemplateSource {
    fn fetch(&self, path: &str) -> Result<String, FetchError> {
        self.resources
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: path.to_string(),
            })
    }
}

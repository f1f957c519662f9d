//! Loading named template sets into a [`TemplateRegistry`].

use crate::error::TemplateLoadError;
use crate::registry::{MergeStats, Template, TemplateRegistry};
use crate::source::{FetchError, TemplateSource, template_set_path};
use crate::task_group::{Settled, TaskGroup};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors produced while turning a fetched resource into templates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("markup parser unavailable: {0}")]
    /// The markup parser could not be set up.
    Parser(String),

    #[error("template set {set:?} could not be parsed")]
    /// The resource could not be parsed as markup.
    Unparseable {
        /// Name of the template set.
        set: String,
    },
}

/// Parses a fetched template-set resource into templates.
pub trait TemplateExtractor: Send + Sync {
    /// Extract every template found in `markup`, which was loaded as the set `set_name`.
    fn extract(&self, set_name: &str, markup: &str) -> Result<Vec<Template>, ExtractError>;
}

/// Summary of a load in which every set succeeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Number of template sets loaded.
    pub sets: usize,
    /// What happened to the templates found in them.
    pub merged: MergeStats,
}

/// Fetches template sets concurrently and merges them into a registry.
#[derive(Clone)]
pub struct TemplateSetLoader {
    source: Arc<dyn TemplateSource>,
    extractor: Arc<dyn TemplateExtractor>,
    fetch_timeout: Option<Duration>,
}

impl std::fmt::Debug for TemplateSetLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSetLoader")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl TemplateSetLoader {
    /// Create a loader from a resource source and a markup extractor.
    pub fn new(source: Arc<dyn TemplateSource>, extractor: Arc<dyn TemplateExtractor>) -> Self {
        Self {
            source,
            extractor,
            fetch_timeout: None,
        }
    }

    /// Give up on fetches that have not settled after `timeout` (none by default).
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The configured fetch timeout.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout
    }

    /// Load every set in `names` from `base_path` into `registry`.
    ///
    /// Each set is fetched from `base_path + "errors." + name + ".html"`. All fetches run
    /// concurrently and the call returns once every one of them has settled. Sets that loaded
    /// are merged even when others failed; in that case the result is a [`TemplateLoadError`]
    /// that counts the failures without naming them.
    pub fn load<S: AsRef<str>>(
        &self,
        registry: &TemplateRegistry,
        base_path: &str,
        names: &[S],
    ) -> Result<LoadSummary, TemplateLoadError> {
        let mut group = TaskGroup::new().with_timeout(self.fetch_timeout);
        let mut requests = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref().to_string();
            let path = template_set_path(base_path, &name);
            let source = Arc::clone(&self.source);
            let task_path = path.clone();
            group.spawn(name.clone(), move || source.fetch(&task_path));
            requests.push((name, path));
        }

        let settled = group.join();

        let mut merged = MergeStats::default();
        let mut failed = 0;
        for ((name, path), outcome) in requests.iter().zip(settled) {
            let fetched = match outcome {
                Settled::Finished(result) => result,
                Settled::TimedOut => Err(FetchError::TimedOut {
                    path: path.clone(),
                    after: self.fetch_timeout.unwrap_or_default(),
                }),
                Settled::Lost => {
                    tracing::warn!(set = %name, path = %path, "template fetch aborted");
                    failed += 1;
                    continue;
                }
            };

            let markup = match fetched {
                Ok(markup) => markup,
                Err(err) => {
                    tracing::warn!(set = %name, path = %path, error = %err, "template set failed to load");
                    failed += 1;
                    continue;
                }
            };

            match self.extractor.extract(name, &markup) {
                Ok(templates) => {
                    let found = templates.len();
                    let stats = registry.extend(templates);
                    tracing::debug!(
                        set = %name,
                        found,
                        added = stats.added,
                        replaced = stats.replaced,
                        rejected = stats.rejected,
                        "merged template set"
                    );
                    merged.absorb(stats);
                }
                Err(err) => {
                    tracing::warn!(set = %name, path = %path, error = %err, "template set failed to parse");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(TemplateLoadError {
                failed,
                requested: requests.len(),
                merged,
            });
        }

        Ok(LoadSummary {
            sets: requests.len(),
            merged,
        })
    }
}

//! Message templates and the registry that indexes them by error type.

use crate::error::TemplateLoadError;
use crate::loader::{LoadSummary, TemplateSetLoader};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A message template: markup with placeholders, tagged with the error type it explains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    type_id: String,
    body: Arc<str>,
    origin: Option<String>,
}

impl Template {
    /// Create a template for `type_id`.
    pub fn new(type_id: impl Into<String>, body: impl Into<Arc<str>>) -> Self {
        Self {
            type_id: type_id.into(),
            body: body.into(),
            origin: None,
        }
    }

    /// Record the template set this template was loaded from.
    pub fn with_origin(mut self, set_name: impl Into<String>) -> Self {
        self.origin = Some(set_name.into());
        self
    }

    /// The error type this template serves.
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    /// The template markup.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Name of the template set this template came from, if known.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }
}

/// What to do when a template is inserted for a type that already has one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Replace the existing template (logged as a warning).
    #[default]
    LastWins,
    /// Keep the existing template and drop the new one (logged as a warning).
    Reject,
}

/// Result of a single [`TemplateRegistry::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No template existed for the type.
    Added,
    /// The previous template was replaced; it is returned here.
    Replaced(Template),
    /// The new template was refused; it is returned here.
    Rejected(Template),
}

/// Counters for a batch of inserts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Templates for previously unknown types.
    pub added: usize,
    /// Templates that replaced an existing entry.
    pub replaced: usize,
    /// Templates refused under [`DuplicatePolicy::Reject`].
    pub rejected: usize,
}

impl MergeStats {
    /// Fold another batch into this one.
    pub fn absorb(&mut self, other: MergeStats) {
        self.added += other.added;
        self.replaced += other.replaced;
        self.rejected += other.rejected;
    }

    fn record(&mut self, outcome: &InsertOutcome) {
        match outcome {
            InsertOutcome::Added => self.added += 1,
            InsertOutcome::Replaced(_) => self.replaced += 1,
            InsertOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

/// Anything the renderer can resolve an error type against.
pub trait TemplateLookup {
    /// Find the template for `type_id`.
    fn lookup(&self, type_id: &str) -> Option<Template>;
}

/// An append-only mapping from error type to [`Template`].
///
/// The registry is shared by reference: loads and lookups take `&self`, so one instance can be
/// populated from several loads (even concurrently) while renderers read it. Entries are never
/// removed.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: RwLock<HashMap<String, Template>>,
    policy: DuplicatePolicy,
}

impl TemplateRegistry {
    /// Create an empty registry with the default [`DuplicatePolicy`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with an explicit duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            templates: RwLock::default(),
            policy,
        }
    }

    /// The process-wide registry used when no collection is passed to the renderer.
    pub fn global() -> &'static TemplateRegistry {
        static GLOBAL: OnceLock<TemplateRegistry> = OnceLock::new();
        GLOBAL.get_or_init(TemplateRegistry::new)
    }

    /// The duplicate policy in effect.
    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Insert one template, applying the duplicate policy.
    pub fn insert(&self, template: Template) -> InsertOutcome {
        let mut templates = self.templates.write().unwrap_or_else(PoisonError::into_inner);

        let Some(existing) = templates.get(template.type_id()) else {
            templates.insert(template.type_id().to_string(), template);
            return InsertOutcome::Added;
        };

        match self.policy {
            DuplicatePolicy::LastWins => {
                tracing::warn!(
                    type_id = template.type_id(),
                    previous = existing.origin().unwrap_or("<inline>"),
                    replacement = template.origin().unwrap_or("<inline>"),
                    "duplicate error template replaced"
                );
                let previous = templates.insert(template.type_id().to_string(), template);
                match previous {
                    Some(previous) => InsertOutcome::Replaced(previous),
                    None => InsertOutcome::Added,
                }
            }
            DuplicatePolicy::Reject => {
                tracing::warn!(
                    type_id = template.type_id(),
                    kept = existing.origin().unwrap_or("<inline>"),
                    rejected = template.origin().unwrap_or("<inline>"),
                    "duplicate error template rejected"
                );
                InsertOutcome::Rejected(template)
            }
        }
    }

    /// Insert a batch of templates.
    pub fn extend(&self, templates: impl IntoIterator<Item = Template>) -> MergeStats {
        let mut stats = MergeStats::default();
        for template in templates {
            let outcome = self.insert(template);
            stats.record(&outcome);
        }
        stats
    }

    /// Load named template sets from `base_path` and merge them into this registry.
    ///
    /// See [`TemplateSetLoader::load`].
    pub fn load_template_sets<S: AsRef<str>>(
        &self,
        loader: &TemplateSetLoader,
        base_path: &str,
        names: &[S],
    ) -> Result<LoadSummary, TemplateLoadError> {
        loader.load(self, base_path, names)
    }

    /// All templates serving `type_id` (zero or one).
    pub fn templates_matching(&self, type_id: &str) -> Vec<Template> {
        self.get(type_id).into_iter().collect()
    }

    /// The template serving `type_id`, if any.
    pub fn get(&self, type_id: &str) -> Option<Template> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(type_id)
            .cloned()
    }

    /// Whether a template exists for `type_id`.
    pub fn contains(&self, type_id: &str) -> bool {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(type_id)
    }

    /// Number of registered error types.
    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been loaded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered error types, sorted.
    pub fn type_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

impl TemplateLookup for TemplateRegistry {
    fn lookup(&self, type_id: &str) -> Option<Template> {
        self.get(type_id)
    }
}

/// A plain list resolves to its first template with a matching type.
impl TemplateLookup for [Template] {
    fn lookup(&self, type_id: &str) -> Option<Template> {
        self.iter().find(|t| t.type_id() == type_id).cloned()
    }
}

impl TemplateLookup for Vec<Template> {
    fn lookup(&self, type_id: &str) -> Option<Template> {
        self.as_slice().lookup(type_id)
    }
}

//! Errors surfaced by loading and rendering.

use crate::engine::TemplateError;
use crate::registry::MergeStats;
use thiserror::Error;

/// At least one template set failed to load.
///
/// Sets that did load were merged into the registry anyway. The error deliberately does not
/// say which sources failed; those are logged individually as they settle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at least one template file did not load ({failed} of {requested} failed)")]
pub struct TemplateLoadError {
    /// Number of template sets that failed to fetch or parse.
    pub failed: usize,
    /// Number of template sets requested.
    pub requested: usize,
    /// Templates merged from the sets that did load.
    pub merged: MergeStats,
}

/// No template is registered for an error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error template not found for {error_type}")]
pub struct TemplateNotFoundError {
    /// The error type that has no template.
    pub error_type: String,
}

/// Errors produced by [`ErrorRenderer`](crate::ErrorRenderer).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    /// No template matched the record's type.
    TemplateNotFound(#[from] TemplateNotFoundError),

    #[error("failed to render template for {error_type}: {source}")]
    /// The templating engine rejected the template or the record.
    Template {
        /// The error type being rendered.
        error_type: String,
        /// The engine failure.
        #[source]
        source: TemplateError,
    },
}

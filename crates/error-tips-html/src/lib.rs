#![warn(missing_docs)]
//! `error-tips-html` - HTML support for `error-tips`, backed by Tree-sitter.
//!
//! This crate provides:
//!
//! - [`HtmlTemplateExtractor`], which finds `error-msg` template elements in template-set
//!   resources and plugs into `error_tips::TemplateSetLoader`
//! - [`enumerate_highlights`] / [`highlights`], which walk rendered markup for
//!   `data-highlight` descriptors so a host can decorate the source text

mod document;
mod extract;
mod highlight;

pub use document::{Attribute, Element, HtmlFragment, MarkupError};
pub use extract::HtmlTemplateExtractor;
pub use highlight::{HighlightError, HighlightedElement, enumerate_highlights, highlights};

use error_tips::{TemplateSetLoader, TemplateSource, TipsConfig};
use std::sync::Arc;

/// A loader that reads resources from `source` and extracts templates as HTML.
pub fn html_loader(source: Arc<dyn TemplateSource>) -> TemplateSetLoader {
    TemplateSetLoader::new(source, Arc::new(HtmlTemplateExtractor::default()))
}

/// A loader configured from `config` (marker class, fetch timeout).
pub fn loader_from_config(config: &TipsConfig, source: Arc<dyn TemplateSource>) -> TemplateSetLoader {
    TemplateSetLoader::new(
        source,
        Arc::new(HtmlTemplateExtractor::new(config.marker_class.clone())),
    )
    .with_fetch_timeout(config.fetch_timeout())
}

#![warn(missing_docs)]
//! Error Tips - friendly explanations for structured parse errors
//!
//! # Overview
//!
//! `error-tips` turns machine-produced error records (`{"type": "...", ...fields}`) into
//! human-readable markup. Each error type has a message template; templates are grouped in
//! named template sets, loaded into a [`TemplateRegistry`], and rendered by an
//! [`ErrorRenderer`] into any [`RenderTarget`]. Messages point back at the source with
//! `data-highlight="start,end"` descriptors, parsed by [`parse_interval`].
//!
//! The crate is headless: it does not know how resources are fetched ([`TemplateSource`]),
//! how markup is parsed ([`TemplateExtractor`]; see `error-tips-html`), or where the result is
//! displayed ([`RenderTarget`]).
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ErrorRenderer / RenderTarget               │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  TemplateEngine (escape + evaluate syntax)  │  ← Substitution
//! ├─────────────────────────────────────────────┤
//! │  TemplateRegistry                           │  ← Type → Template
//! ├─────────────────────────────────────────────┤
//! │  TemplateSetLoader (all-settle TaskGroup)   │  ← Concurrent loading
//! ├─────────────────────────────────────────────┤
//! │  TemplateSource / TemplateExtractor         │  ← Fetch + parse seams
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use error_tips::{ErrorRecord, ErrorRenderer, MessagePane, Template, TemplateRegistry};
//!
//! let registry = TemplateRegistry::new();
//! registry.insert(Template::new("missing-semicolon", "Line {{line}}: add a <code>;</code>"));
//!
//! let error = ErrorRecord::new("missing-semicolon").with_field("line", 4);
//! let mut pane = MessagePane::new();
//! ErrorRenderer::new()
//!     .fill_error(&mut pane, &error, Some(&registry))
//!     .unwrap();
//!
//! assert_eq!(pane.markup(), "Line 4: add a <code>;</code>");
//! assert!(pane.is_visible());
//! ```
//!
//! # Module Description
//!
//! - [`record`] - error records and dotted field paths
//! - [`interval`] - highlight descriptor parsing
//! - [`registry`] - templates and the type-keyed registry
//! - [`source`] - resource fetching
//! - [`task_group`] - all-settle concurrent join
//! - [`loader`] - template-set loading
//! - [`engine`] - the templating engine
//! - [`render`] - error rendering into targets
//! - [`config`] - YAML configuration

pub mod config;
pub mod engine;
pub mod error;
pub mod interval;
pub mod loader;
pub mod record;
pub mod registry;
pub mod render;
pub mod source;
pub mod task_group;

pub use config::{ConfigError, DEFAULT_MARKER_CLASS, TipsConfig};
pub use engine::{
    MustacheEngine, SyntaxError, TemplateEngine, TemplateError, TemplateSyntax, escape_html,
};
pub use error::{RenderError, TemplateLoadError, TemplateNotFoundError};
pub use interval::{HIGHLIGHT_ATTRIBUTE, HighlightInterval, MalformedIntervalError, parse_interval};
pub use loader::{ExtractError, LoadSummary, TemplateExtractor, TemplateSetLoader};
pub use record::{ErrorRecord, RecordError, TYPE_FIELD};
pub use registry::{
    DuplicatePolicy, InsertOutcome, MergeStats, Template, TemplateLookup, TemplateRegistry,
};
pub use render::{ErrorRenderer, MessagePane, RenderTarget, fill_error};
pub use source::{
    FetchError, FsTemplateSource, MemoryTemplateSource, TemplateSource, template_set_path,
};
pub use task_group::{Settled, TaskGroup};

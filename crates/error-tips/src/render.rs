//! Filling a display surface with the friendly message for an error record.

use crate::engine::{MustacheEngine, TemplateEngine, TemplateSyntax};
use crate::error::{RenderError, TemplateNotFoundError};
use crate::record::ErrorRecord;
use crate::registry::{TemplateLookup, TemplateRegistry};

/// A surface that rendered markup can be mounted into.
pub trait RenderTarget {
    /// Replace the surface's content with `markup`.
    fn mount(&mut self, markup: String);

    /// Make the surface visible.
    fn show(&mut self);
}

/// An in-memory [`RenderTarget`]: remembers the mounted markup and whether it is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePane {
    markup: String,
    visible: bool,
}

impl MessagePane {
    /// An empty, hidden pane.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently mounted markup.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Whether the pane is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Hide the pane, keeping its content.
    pub fn hide(&mut self) {
        self.visible = false;
    }
}

impl RenderTarget for MessagePane {
    fn mount(&mut self, markup: String) {
        self.markup = markup;
    }

    fn show(&mut self) {
        self.visible = true;
    }
}

/// Resolves error records to templates and renders them.
#[derive(Debug, Clone, Default)]
pub struct ErrorRenderer<E = MustacheEngine> {
    engine: E,
    syntax: TemplateSyntax,
}

impl ErrorRenderer {
    /// A renderer using [`MustacheEngine`] and the default delimiters.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: TemplateEngine> ErrorRenderer<E> {
    /// A renderer using a custom engine and the default delimiters.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            syntax: TemplateSyntax::default(),
        }
    }

    /// Replace the delimiter syntax.
    pub fn with_syntax(mut self, syntax: TemplateSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// The engine in use.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The delimiter syntax in use.
    pub fn syntax(&self) -> &TemplateSyntax {
        &self.syntax
    }

    /// Render the message for `error` without touching any surface.
    ///
    /// `templates` overrides the collection to search; `None` means
    /// [`TemplateRegistry::global`].
    pub fn render_markup(
        &self,
        error: &ErrorRecord,
        templates: Option<&dyn TemplateLookup>,
    ) -> Result<String, RenderError> {
        let templates = templates.unwrap_or(TemplateRegistry::global());
        let template = templates.lookup(error.error_type()).ok_or_else(|| {
            TemplateNotFoundError {
                error_type: error.error_type().to_string(),
            }
        })?;

        self.engine
            .render(template.body(), error.as_value(), &self.syntax)
            .map_err(|source| RenderError::Template {
                error_type: error.error_type().to_string(),
                source,
            })
    }

    /// Fill `target` with the message for `error`, show it, and return it for chaining.
    ///
    /// On failure the target is left exactly as it was.
    pub fn fill_error<'t, T: RenderTarget + ?Sized>(
        &self,
        target: &'t mut T,
        error: &ErrorRecord,
        templates: Option<&dyn TemplateLookup>,
    ) -> Result<&'t mut T, RenderError> {
        let markup = self.render_markup(error, templates)?;
        target.mount(markup);
        target.show();
        Ok(target)
    }
}

/// Fill `target` using the global registry and the default renderer.
pub fn fill_error<'t, T: RenderTarget + ?Sized>(
    target: &'t mut T,
    error: &ErrorRecord,
) -> Result<&'t mut T, RenderError> {
    ErrorRenderer::new().fill_error(target, error, None)
}

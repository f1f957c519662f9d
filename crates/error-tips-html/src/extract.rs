use crate::document::{HtmlFragment, MarkupError};
use error_tips::{DEFAULT_MARKER_CLASS, ExtractError, Template, TemplateExtractor};

/// Finds error-message templates in an HTML template-set resource.
///
/// A template is any element classed with the marker class (`error-msg` by default); every
/// other class on the element names an error type it serves. The template body is the
/// element's inner markup, verbatim.
#[derive(Debug, Clone)]
pub struct HtmlTemplateExtractor {
    marker_class: String,
}

impl Default for HtmlTemplateExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_CLASS)
    }
}

impl HtmlTemplateExtractor {
    /// Create an extractor for templates marked with `marker_class`.
    pub fn new(marker_class: impl Into<String>) -> Self {
        Self {
            marker_class: marker_class.into(),
        }
    }

    /// The class identifying template elements.
    pub fn marker_class(&self) -> &str {
        &self.marker_class
    }

    /// Collect the templates in `markup`, tagging each with `set_name`.
    pub fn templates_in(&self, set_name: &str, markup: &str) -> Result<Vec<Template>, MarkupError> {
        let fragment = HtmlFragment::parse(markup)?;
        if fragment.has_errors() {
            tracing::debug!(set = %set_name, "template set contains malformed markup");
        }

        let mut templates = Vec::new();
        for element in fragment.elements() {
            if !element.has_class(&self.marker_class) {
                continue;
            }

            let mut type_ids: Vec<&str> = Vec::new();
            for class in element.classes() {
                if class != self.marker_class && !type_ids.contains(&class) {
                    type_ids.push(class);
                }
            }

            if type_ids.is_empty() {
                tracing::warn!(
                    set = %set_name,
                    marker = %self.marker_class,
                    "template element has no error-type class; skipped"
                );
                continue;
            }

            for type_id in type_ids {
                templates.push(Template::new(type_id, element.inner_html()).with_origin(set_name));
            }
        }

        Ok(templates)
    }
}

impl TemplateExtractor for HtmlTemplateExtractor {
    fn extract(&self, set_name: &str, markup: &str) -> Result<Vec<Template>, ExtractError> {
        self.templates_in(set_name, markup).map_err(|err| match err {
            MarkupError::Language(message) => ExtractError::Parser(message),
            MarkupError::Parse => ExtractError::Unparseable {
                set: set_name.to_string(),
            },
        })
    }
}

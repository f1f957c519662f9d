//! Enumerating `data-highlight` regions in rendered markup.

use crate::document::{Element, HtmlFragment, MarkupError};
use error_tips::{HIGHLIGHT_ATTRIBUTE, HighlightInterval, MalformedIntervalError, parse_interval};
use thiserror::Error;

/// Errors produced while enumerating highlights.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    #[error(transparent)]
    /// The scope could not be parsed.
    Markup(#[from] MarkupError),

    #[error(transparent)]
    /// A `data-highlight` descriptor was malformed.
    Interval(#[from] MalformedIntervalError),
}

/// An element carrying a highlight descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedElement {
    /// Zero-based position among highlighted elements in the scope.
    pub index: usize,
    /// The parsed descriptor.
    pub interval: HighlightInterval,
    /// The element's tag name.
    pub tag_name: String,
    /// The element's inner markup.
    pub inner_html: String,
}

impl Element<'_> {
    /// The element's parsed `data-highlight` descriptor, if it has one.
    pub fn highlight_interval(&self) -> Option<Result<HighlightInterval, MalformedIntervalError>> {
        self.attribute(HIGHLIGHT_ATTRIBUTE).map(parse_interval)
    }
}

/// Every element in `scope` carrying `data-highlight`, in document order.
pub fn highlights(scope: &str) -> Result<Vec<HighlightedElement>, HighlightError> {
    let fragment = HtmlFragment::parse(scope)?;
    if fragment.has_errors() {
        tracing::warn!(len = scope.len(), "highlight scope contains malformed markup");
    }

    let mut out = Vec::new();
    for element in fragment.elements() {
        let Some(interval) = element.highlight_interval() else {
            continue;
        };
        out.push(HighlightedElement {
            index: out.len(),
            interval: interval?,
            tag_name: element.tag_name().to_string(),
            inner_html: element.inner_html().to_string(),
        });
    }
    Ok(out)
}

/// Call `callback(start, end, index)` for every highlighted element in `scope`.
///
/// Descriptors are all parsed before the first call, so a malformed one yields an error and
/// no calls at all. Returns the number of highlighted elements.
pub fn enumerate_highlights<F>(scope: &str, mut callback: F) -> Result<usize, HighlightError>
where
    F: FnMut(usize, Option<usize>, usize),
{
    let found = highlights(scope)?;
    for highlight in &found {
        callback(
            highlight.interval.start,
            highlight.interval.end,
            highlight.index,
        );
    }
    Ok(found.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_highlight_interval() {
        let fragment = HtmlFragment::parse(r#"<em data-highlight="3,8">x</em><b>y</b>"#).unwrap();
        let elements = fragment.elements();

        assert_eq!(
            elements[0].highlight_interval(),
            Some(Ok(HighlightInterval::span(3, 8)))
        );
        assert_eq!(elements[1].highlight_interval(), None);
    }

    #[test]
    fn test_malformed_descriptor_stops_before_callbacks() {
        let mut calls = 0;
        let result = enumerate_highlights(
            r#"<i data-highlight="1">a</i><i data-highlight="oops">b</i>"#,
            |_, _, _| calls += 1,
        );

        assert!(matches!(
            result,
            Err(HighlightError::Interval(MalformedIntervalError::InvalidStart { .. }))
        ));
        assert_eq!(calls, 0);
    }
}

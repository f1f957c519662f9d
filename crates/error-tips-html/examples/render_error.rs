//! Load an in-memory template set, render an error into a pane, then list its highlights.
//!
//! Run with `RUST_LOG=debug` to see loader and registry events.

use error_tips::{ErrorRecord, ErrorRenderer, MemoryTemplateSource, MessagePane, TemplateRegistry};
use error_tips_html::{enumerate_highlights, html_loader};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const TEMPLATES: &str = r#"
<div class="error-msg UNCLOSED_TAG">
  <p>The <em data-highlight="{{openTag.start}},{{openTag.end}}">&lt;{{openTag.name}}&gt;</em>
  tag never closes.</p>
</div>
<div class="error-msg JAVASCRIPT_URL_NOT_ALLOWED">
  <p>Sorry, but <em data-highlight="{{value.start}}">javascript:</em> URLs are not allowed.</p>
</div>
"#;

/// The characters of `text` in `start..end`, clamped to its length.
fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |offset: usize| {
        text.char_indices()
            .nth(offset)
            .map_or(text.len(), |(byte, _)| byte)
    };
    let end = byte_at(end);
    &text[byte_at(start).min(end)..end]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let source = MemoryTemplateSource::new().with_resource("templates/errors.base.html", TEMPLATES);
    let registry = TemplateRegistry::new();
    let summary = registry.load_template_sets(&html_loader(Arc::new(source)), "templates/", &["base"])?;
    println!(
        "loaded {} set(s), {} template(s): {:?}",
        summary.sets,
        registry.len(),
        registry.type_ids()
    );

    let source_text = "<p>Grüße <b>welt</b>";
    let error = ErrorRecord::from_json_str(
        r#"{"type": "UNCLOSED_TAG", "openTag": {"name": "p", "start": 0, "end": 3}}"#,
    )?;

    let mut pane = MessagePane::new();
    ErrorRenderer::new().fill_error(&mut pane, &error, Some(&registry))?;
    println!("message: {}", pane.markup().trim());

    enumerate_highlights(pane.markup(), |start, end, index| {
        let end = end.unwrap_or(start + 1);
        println!("highlight #{index}: {:?}", char_slice(source_text, start, end));
    })?;

    Ok(())
}

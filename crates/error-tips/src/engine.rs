//! Text templating for error messages.
//!
//! Templates use two delimiter families, both configured through [`TemplateSyntax`]:
//!
//! - escaping interpolation, `{{openTag.name}}`: the value at a dotted path, HTML-escaped
//! - evaluation, `[% ... %]`: control flow around fragments of the template
//!
//! The evaluation grammar understood by [`MustacheEngine`]:
//!
//! ```text
//! [% if path %] ... [% else %] ... [% end %]
//! [% unless path %] ... [% end %]
//! [% for item in path %] ... {{item.name}} {{loop.index}} ... [% end %]
//! ```

use crate::record::lookup_path;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

/// Default escaping-interpolation pattern: `{{expr}}`.
pub const ESCAPE_PATTERN: &str = r"\{\{(.+?)\}\}";
/// Default evaluation pattern: `[% expr %]`.
pub const EVALUATE_PATTERN: &str = r"\[%(.+?)%\]";

static MUSTACHE: LazyLock<TemplateSyntax> = LazyLock::new(|| {
    TemplateSyntax::new(ESCAPE_PATTERN, EVALUATE_PATTERN)
        .expect("built-in template delimiters are valid")
});

/// Errors produced while building a [`TemplateSyntax`].
#[derive(Debug, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    /// The delimiter pattern is not a valid regex.
    Regex(#[from] regex::Error),

    #[error("delimiter pattern {0:?} has no capture group for the expression")]
    /// The pattern must capture the expression in group 1.
    MissingCaptureGroup(String),
}

/// Errors produced while rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("empty template expression")]
    /// `{{ }}` or `[% %]` with nothing inside.
    EmptyExpression,

    #[error("unsupported expression {0:?}; only dotted field paths are allowed")]
    /// An interpolation that is not a plain field path.
    UnsupportedExpression(String),

    #[error("unknown template directive {0:?}")]
    /// An evaluation block the engine does not understand.
    UnknownDirective(String),

    #[error("unexpected `{0}` with no open block")]
    /// `else` or `end` outside of a block.
    UnexpectedDirective(String),

    #[error("block `{0}` is never closed")]
    /// A block without a matching `end`.
    Unclosed(String),

    #[error("template field `{0}` is missing from the error record")]
    /// Strict mode: an interpolated path did not resolve.
    MissingField(String),

    #[error("template field `{0}` is not a list")]
    /// A `for` block over something that is not an array.
    NotIterable(String),
}

/// The delimiter pair recognized inside template bodies.
///
/// Each pattern must capture the inner expression in group 1.
#[derive(Debug, Clone)]
pub struct TemplateSyntax {
    escape: Regex,
    evaluate: Regex,
}

impl TemplateSyntax {
    /// Build a syntax from custom delimiter patterns.
    pub fn new(escape: &str, evaluate: &str) -> Result<Self, SyntaxError> {
        Ok(Self {
            escape: compile_delimiter(escape)?,
            evaluate: compile_delimiter(evaluate)?,
        })
    }

    /// `{{expr}}` for escaped interpolation, `[% expr %]` for evaluation.
    pub fn mustache() -> Self {
        MUSTACHE.clone()
    }

    /// The escaping-interpolation pattern.
    pub fn escape(&self) -> &Regex {
        &self.escape
    }

    /// The evaluation pattern.
    pub fn evaluate(&self) -> &Regex {
        &self.evaluate
    }
}

impl Default for TemplateSyntax {
    fn default() -> Self {
        Self::mustache()
    }
}

fn compile_delimiter(pattern: &str) -> Result<Regex, SyntaxError> {
    let regex = Regex::new(pattern)?;
    if regex.captures_len() < 2 {
        return Err(SyntaxError::MissingCaptureGroup(pattern.to_string()));
    }
    Ok(regex)
}

/// A pluggable substitution engine.
pub trait TemplateEngine: Send + Sync {
    /// Render `template` against `data` using the delimiters in `syntax`.
    fn render(
        &self,
        template: &str,
        data: &Value,
        syntax: &TemplateSyntax,
    ) -> Result<String, TemplateError>;
}

/// The default engine: field-path interpolation plus `if`/`unless`/`for` blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MustacheEngine {
    strict: bool,
}

impl MustacheEngine {
    /// A lenient engine: missing fields render as empty text.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that fails on missing interpolated fields.
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Toggle strict field resolution.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether missing fields are errors.
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

impl TemplateEngine for MustacheEngine {
    fn render(
        &self,
        template: &str,
        data: &Value,
        syntax: &TemplateSyntax,
    ) -> Result<String, TemplateError> {
        let tokens = tokenize(template, syntax);
        let nodes = parse(tokens)?;

        let mut scope = Scope {
            root: data,
            bindings: Vec::new(),
            strict: self.strict,
        };
        let mut out = String::with_capacity(template.len());
        render_nodes(&nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'t> {
    Text(&'t str),
    Escape(&'t str),
    Evaluate(&'t str),
}

fn tokenize<'t>(template: &'t str, syntax: &TemplateSyntax) -> Vec<Token<'t>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < template.len() {
        let escape = syntax.escape.captures_at(template, pos);
        let evaluate = syntax.evaluate.captures_at(template, pos);

        let (caps, is_escape) = match (escape, evaluate) {
            (None, None) => break,
            (Some(e), None) => (e, true),
            (None, Some(v)) => (v, false),
            (Some(e), Some(v)) => {
                let e_start = e.get(0).map_or(usize::MAX, |m| m.start());
                let v_start = v.get(0).map_or(usize::MAX, |m| m.start());
                if e_start <= v_start { (e, true) } else { (v, false) }
            }
        };

        let Some(whole) = caps.get(0) else {
            break;
        };
        if whole.start() > pos {
            tokens.push(Token::Text(&template[pos..whole.start()]));
        }
        let expr = caps.get(1).map_or("", |m| m.as_str());
        tokens.push(if is_escape {
            Token::Escape(expr)
        } else {
            Token::Evaluate(expr)
        });

        if whole.end() > pos {
            pos = whole.end();
        } else {
            // Zero-width match from a custom pattern: emit one char and move on.
            let step = template[pos..].chars().next().map_or(1, char::len_utf8);
            tokens.push(Token::Text(&template[pos..pos + step]));
            pos += step;
        }
    }

    if pos < template.len() {
        tokens.push(Token::Text(&template[pos..]));
    }
    tokens
}

#[derive(Debug)]
enum Node<'t> {
    Text(&'t str),
    Value(&'t str),
    If {
        negate: bool,
        path: &'t str,
        then: Vec<Node<'t>>,
        otherwise: Vec<Node<'t>>,
    },
    For {
        binding: &'t str,
        path: &'t str,
        body: Vec<Node<'t>>,
    },
}

enum Directive<'t> {
    If { negate: bool, path: &'t str },
    For { binding: &'t str, path: &'t str },
    Else,
    End,
}

impl<'t> Directive<'t> {
    fn parse(raw: &'t str) -> Result<Self, TemplateError> {
        let words: Vec<&'t str> = raw.split_whitespace().collect();
        match words.as_slice() {
            [] => Err(TemplateError::EmptyExpression),
            ["if", path] => Ok(Self::If {
                negate: false,
                path: parse_path(*path)?,
            }),
            ["unless", path] => Ok(Self::If {
                negate: true,
                path: parse_path(*path)?,
            }),
            ["for", binding, "in", path] if is_identifier(binding) => Ok(Self::For {
                binding: *binding,
                path: parse_path(*path)?,
            }),
            ["else"] => Ok(Self::Else),
            ["end"] => Ok(Self::End),
            _ => Err(TemplateError::UnknownDirective(raw.trim().to_string())),
        }
    }
}

enum Stop {
    Else,
    End,
    Eof,
}

fn parse(tokens: Vec<Token<'_>>) -> Result<Vec<Node<'_>>, TemplateError> {
    let mut tokens = tokens.into_iter();
    let (nodes, stop) = parse_nodes(&mut tokens)?;
    match stop {
        Stop::Eof => Ok(nodes),
        Stop::Else => Err(TemplateError::UnexpectedDirective("else".to_string())),
        Stop::End => Err(TemplateError::UnexpectedDirective("end".to_string())),
    }
}

fn parse_nodes<'t>(
    tokens: &mut std::vec::IntoIter<Token<'t>>,
) -> Result<(Vec<Node<'t>>, Stop), TemplateError> {
    let mut nodes = Vec::new();

    while let Some(token) = tokens.next() {
        match token {
            Token::Text(text) => nodes.push(Node::Text(text)),
            Token::Escape(expr) => nodes.push(Node::Value(parse_path(expr)?)),
            Token::Evaluate(raw) => match Directive::parse(raw)? {
                Directive::Else => return Ok((nodes, Stop::Else)),
                Directive::End => return Ok((nodes, Stop::End)),
                Directive::If { negate, path } => {
                    let (then, stop) = parse_nodes(tokens)?;
                    let otherwise = match stop {
                        Stop::End => Vec::new(),
                        Stop::Else => {
                            let (otherwise, stop) = parse_nodes(tokens)?;
                            match stop {
                                Stop::End => otherwise,
                                Stop::Else => {
                                    return Err(TemplateError::UnexpectedDirective(
                                        "else".to_string(),
                                    ));
                                }
                                Stop::Eof => {
                                    return Err(TemplateError::Unclosed(raw.trim().to_string()));
                                }
                            }
                        }
                        Stop::Eof => return Err(TemplateError::Unclosed(raw.trim().to_string())),
                    };
                    nodes.push(Node::If {
                        negate,
                        path,
                        then,
                        otherwise,
                    });
                }
                Directive::For { binding, path } => {
                    let (body, stop) = parse_nodes(tokens)?;
                    match stop {
                        Stop::End => {}
                        Stop::Else => {
                            return Err(TemplateError::UnexpectedDirective("else".to_string()));
                        }
                        Stop::Eof => return Err(TemplateError::Unclosed(raw.trim().to_string())),
                    }
                    nodes.push(Node::For {
                        binding,
                        path,
                        body,
                    });
                }
            },
        }
    }

    Ok((nodes, Stop::Eof))
}

fn parse_path(expr: &str) -> Result<&str, TemplateError> {
    let path = expr.trim();
    if path.is_empty() {
        return Err(TemplateError::EmptyExpression);
    }
    if !path.split('.').all(is_identifier) {
        return Err(TemplateError::UnsupportedExpression(path.to_string()));
    }
    Ok(path)
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '-')
}

struct Scope<'d> {
    root: &'d Value,
    bindings: Vec<(String, Value)>,
    strict: bool,
}

impl Scope<'_> {
    fn resolve(&self, path: &str) -> Option<&Value> {
        let (head, rest) = path.split_once('.').unwrap_or((path, ""));
        for (name, value) in self.bindings.iter().rev() {
            if name == head {
                return lookup_path(value, rest);
            }
        }
        lookup_path(self.root, path)
    }
}

fn render_nodes(
    nodes: &[Node<'_>],
    scope: &mut Scope<'_>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Value(path) => match scope.resolve(path) {
                Some(value) => out.push_str(&escape_html(&display_value(value))),
                None if scope.strict => return Err(TemplateError::MissingField(path.to_string())),
                None => tracing::debug!(path = %path, "template field missing; rendering empty"),
            },
            Node::If {
                negate,
                path,
                then,
                otherwise,
            } => {
                let truthy = scope.resolve(path).is_some_and(is_truthy);
                let branch = if truthy != *negate { then } else { otherwise };
                render_nodes(branch, scope, out)?;
            }
            Node::For {
                binding,
                path,
                body,
            } => {
                let items = match scope.resolve(path) {
                    Some(Value::Array(items)) => items.clone(),
                    Some(Value::Null) => Vec::new(),
                    Some(_) => return Err(TemplateError::NotIterable(path.to_string())),
                    None if scope.strict => {
                        return Err(TemplateError::MissingField(path.to_string()));
                    }
                    None => Vec::new(),
                };

                for (index, item) in items.into_iter().enumerate() {
                    let mut loop_info = Map::new();
                    loop_info.insert("index".to_string(), Value::from(index));
                    scope.bindings.push(("loop".to_string(), Value::Object(loop_info)));
                    scope.bindings.push((binding.to_string(), item));

                    let result = render_nodes(body, scope, out);

                    scope.bindings.pop();
                    scope.bindings.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

/// JavaScript-style truthiness.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(template: &str, data: Value) -> Result<String, TemplateError> {
        MustacheEngine::new().render(template, &data, &TemplateSyntax::mustache())
    }

    #[test]
    fn test_interpolation_escapes_html() {
        let out = render(
            "<p>Tag {{openTag.name}} at {{openTag.start}}</p>",
            json!({"openTag": {"name": "<b>", "start": 4}}),
        )
        .unwrap();
        assert_eq!(out, "<p>Tag &lt;b&gt; at 4</p>");
    }

    #[test]
    fn test_missing_field_lenient_and_strict() {
        assert_eq!(render("a{{nope}}b", json!({})).unwrap(), "ab");

        let strict = MustacheEngine::strict().render(
            "a{{nope}}b",
            &json!({}),
            &TemplateSyntax::mustache(),
        );
        assert_eq!(strict, Err(TemplateError::MissingField("nope".to_string())));
    }

    #[test]
    fn test_if_else_and_unless() {
        let template = "[% if closeTag %]closed[% else %]open[% end %]/[% unless name %]anon[% end %]";
        assert_eq!(render(template, json!({"closeTag": {}})).unwrap(), "closed/anon");
        assert_eq!(render(template, json!({"closeTag": 0, "name": "p"})).unwrap(), "open/");
    }

    #[test]
    fn test_for_loop_binds_item_and_index() {
        let out = render(
            "<ul>[% for attr in attributes %]<li>{{loop.index}}:{{attr.name}}</li>[% end %]</ul>",
            json!({"attributes": [{"name": "id"}, {"name": "href"}]}),
        )
        .unwrap();
        assert_eq!(out, "<ul><li>0:id</li><li>1:href</li></ul>");
    }

    #[test]
    fn test_block_errors() {
        assert_eq!(
            render("[% if x %]never closed", json!({})),
            Err(TemplateError::Unclosed("if x".to_string()))
        );
        assert_eq!(
            render("stray [% end %]", json!({})),
            Err(TemplateError::UnexpectedDirective("end".to_string()))
        );
        assert_eq!(
            render("[% while x %][% end %]", json!({})),
            Err(TemplateError::UnknownDirective("while x".to_string()))
        );
        assert_eq!(
            render("[% for a in n %][% end %]", json!({"n": 3})),
            Err(TemplateError::NotIterable("n".to_string()))
        );
        assert_eq!(
            render("{{ a + b }}", json!({})),
            Err(TemplateError::UnsupportedExpression("a + b".to_string()))
        );
    }

    #[test]
    fn test_custom_syntax() {
        let syntax = TemplateSyntax::new(r"<%=(.+?)%>", r"<%(?!=)(.+?)%>").unwrap_err();
        assert!(matches!(syntax, SyntaxError::Regex(_)));

        let syntax = TemplateSyntax::new(r"\$\{(.+?)\}", r"#\{(.+?)\}").unwrap();
        let out = MustacheEngine::new()
            .render("#{if on}${name}#{end}", &json!({"on": true, "name": "x"}), &syntax)
            .unwrap();
        assert_eq!(out, "x");

        assert!(matches!(
            TemplateSyntax::new(r"\{\{.+?\}\}", EVALUATE_PATTERN),
            Err(SyntaxError::MissingCaptureGroup(_))
        ));
    }

    #[test]
    fn test_escape_html_covers_attribute_breakers() {
        assert_eq!(escape_html(r#"a&b"c'd`"#), "a&amp;b&quot;c&#x27;d&#x60;");
    }
}

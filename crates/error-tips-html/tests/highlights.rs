use error_tips::{HighlightInterval, MalformedIntervalError};
use error_tips_html::{HighlightError, enumerate_highlights, highlights};
use pretty_assertions::assert_eq;

#[test]
fn test_three_highlights_in_document_order() {
    let scope = r#"<div class="error-msg">
  <p>First <em data-highlight="0,2">ab</em>,
  then <span data-highlight="5">x</span>
  and finally <b data-highlight="9,9"></b>.</p>
</div>"#;

    let mut seen = Vec::new();
    let count = enumerate_highlights(scope, |start, end, index| {
        seen.push((index, HighlightInterval::new(start, end)));
    })
    .unwrap();

    assert_eq!(count, 3);
    assert_eq!(
        seen,
        vec![
            (0, HighlightInterval::span(0, 2)),
            (1, HighlightInterval::point(5)),
            (2, HighlightInterval::span(9, 9)),
        ]
    );
}

#[test]
fn test_nested_highlights_are_visited_once_each() {
    let scope = r#"<p data-highlight="0,20">outer <em data-highlight="4,6">inner</em></p>"#;

    let found = highlights(scope).unwrap();
    let summary: Vec<(usize, &str, String)> = found
        .iter()
        .map(|h| (h.index, h.tag_name.as_str(), h.interval.to_string()))
        .collect();

    assert_eq!(
        summary,
        vec![
            (0, "p", "0,20".to_string()),
            (1, "em", "4,6".to_string()),
        ]
    );
}

#[test]
fn test_elements_without_descriptor_are_skipped() {
    let scope = "<p>nothing <em>here</em></p>";
    let mut calls = 0;
    let count = enumerate_highlights(scope, |_, _, _| calls += 1).unwrap();
    assert_eq!(count, 0);
    assert_eq!(calls, 0);
}

#[test]
fn test_scope_is_not_mutated() {
    let scope = String::from(r#"<i data-highlight="1,2">x</i>"#);
    let before = scope.clone();
    enumerate_highlights(&scope, |_, _, _| {}).unwrap();
    assert_eq!(scope, before);
}

#[test]
fn test_malformed_descriptor_is_an_error() {
    let err = highlights(r#"<i data-highlight="1,two">x</i>"#).unwrap_err();
    assert_eq!(
        err,
        HighlightError::Interval(MalformedIntervalError::InvalidEnd {
            descriptor: "1,two".to_string(),
            segment: "two".to_string(),
        })
    );
}

#[test]
fn test_unclosed_tags_still_yield_their_highlights() {
    let scope = r#"<p>a <em data-highlight="1,2">b<p>c <b data-highlight="3">d</b>"#;

    let mut seen = Vec::new();
    let count = enumerate_highlights(scope, |start, end, index| {
        seen.push((index, HighlightInterval::new(start, end)));
    })
    .unwrap();

    assert_eq!(count, 2);
    assert_eq!(
        seen,
        vec![
            (0, HighlightInterval::span(1, 2)),
            (1, HighlightInterval::point(3)),
        ]
    );
}

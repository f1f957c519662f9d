//! Highlight descriptors.
//!
//! Rendered messages mark the source ranges they talk about with a `data-highlight`
//! attribute, e.g. `data-highlight="12,18"`. This module parses those descriptors; walking
//! markup to find them lives in the HTML integration crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Attribute carrying a highlight descriptor.
pub const HIGHLIGHT_ATTRIBUTE: &str = "data-highlight";

/// A highlighted character range: `start` plus an optional `end`.
///
/// A missing `end` means the descriptor named a single point (or an unbounded region). It is
/// not the same thing as `end == Some(start)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightInterval {
    /// Start offset (inclusive), in characters.
    pub start: usize,
    /// End offset, if the descriptor supplied one.
    pub end: Option<usize>,
}

impl HighlightInterval {
    /// Create an interval.
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// An interval with no end.
    pub fn point(start: usize) -> Self {
        Self { start, end: None }
    }

    /// An interval with both offsets.
    pub fn span(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    /// Whether the descriptor omitted the end offset.
    pub fn is_point(&self) -> bool {
        self.end.is_none()
    }

    /// `end >= start`, or no end at all.
    ///
    /// Parsing does not enforce this.
    pub fn is_well_ordered(&self) -> bool {
        self.end.is_none_or(|end| end >= self.start)
    }
}

impl fmt::Display for HighlightInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{},{}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

impl FromStr for HighlightInterval {
    type Err = MalformedIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_interval(s)
    }
}

/// A highlight descriptor that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedIntervalError {
    #[error("highlight descriptor {descriptor:?} has no start offset")]
    /// The first segment was empty.
    MissingStart {
        /// The full descriptor.
        descriptor: String,
    },

    #[error("highlight descriptor {descriptor:?} has an invalid start {segment:?}, expected a decimal offset")]
    /// The first segment was not a decimal integer that fits in `usize`.
    InvalidStart {
        /// The full descriptor.
        descriptor: String,
        /// The offending segment.
        segment: String,
    },

    #[error("highlight descriptor {descriptor:?} has an invalid end {segment:?}, expected a decimal offset")]
    /// The second segment was not a decimal integer that fits in `usize`.
    InvalidEnd {
        /// The full descriptor.
        descriptor: String,
        /// The offending segment.
        segment: String,
    },

    #[error("highlight descriptor {descriptor:?} has {count} segments, expected one or two")]
    /// More than two comma-separated segments.
    TooManySegments {
        /// The full descriptor.
        descriptor: String,
        /// Number of segments found.
        count: usize,
    },
}

/// Parse `"<start>"` or `"<start>,<end>"` into a [`HighlightInterval`].
///
/// Segments are trimmed. An empty second segment (`"5,"`) leaves `end` unset.
pub fn parse_interval(descriptor: &str) -> Result<HighlightInterval, MalformedIntervalError> {
    let segments: Vec<&str> = descriptor.split(',').map(str::trim).collect();
    if segments.len() > 2 {
        return Err(MalformedIntervalError::TooManySegments {
            descriptor: descriptor.to_string(),
            count: segments.len(),
        });
    }

    let start_segment = segments[0];
    if start_segment.is_empty() {
        return Err(MalformedIntervalError::MissingStart {
            descriptor: descriptor.to_string(),
        });
    }
    let start = parse_offset(start_segment).ok_or_else(|| MalformedIntervalError::InvalidStart {
        descriptor: descriptor.to_string(),
        segment: start_segment.to_string(),
    })?;

    let end = match segments.get(1) {
        None => None,
        Some(segment) if segment.is_empty() => None,
        Some(segment) => Some(parse_offset(segment).ok_or_else(|| {
            MalformedIntervalError::InvalidEnd {
                descriptor: descriptor.to_string(),
                segment: segment.to_string(),
            }
        })?),
    };

    Ok(HighlightInterval { start, end })
}

// Digits only: `usize::from_str` would also accept a leading `+`.
fn parse_offset(segment: &str) -> Option<usize> {
    if !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

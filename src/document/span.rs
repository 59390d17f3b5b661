//! Positions and selection spans in (line, column) coordinates.
//!
//! Both coordinates are 0-indexed. Columns count chars from the start of the
//! line, not bytes, so `"é"` is one column wide.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A (line, column) position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A user selection from `start` to `end` (end column exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionSpan {
    pub start: Position,
    pub end: Position,
}

impl SelectionSpan {
    /// Build a span, swapping the endpoints if they arrive in reverse order.
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Shorthand for `new(Position::new(..), Position::new(..))`.
    pub fn from_coords(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self::new(
            Position::new(start_line, start_column),
            Position::new(end_line, end_column),
        )
    }

    /// The same span with `start <= end` guaranteed.
    ///
    /// Fields are public, so a span built by hand may be reversed.
    pub fn ordered(&self) -> Self {
        Self::new(self.start, self.end)
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Number of document lines the span touches.
    pub fn line_count(&self) -> usize {
        let span = self.ordered();
        span.end.line - span.start.line + 1
    }
}

impl fmt::Display for SelectionSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Errors from parsing `line:col-line:col` selection strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSpanError {
    #[error("expected `line:col-line:col`, got `{0}`")]
    Shape(String),

    #[error("invalid number `{0}` in selection")]
    Number(String),
}

impl FromStr for Position {
    type Err = ParseSpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, column) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ParseSpanError::Shape(s.to_string()))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<usize>()
                .map_err(|_| ParseSpanError::Number(part.to_string()))
        };
        Ok(Self::new(parse(line)?, parse(column)?))
    }
}

impl FromStr for SelectionSpan {
    type Err = ParseSpanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| ParseSpanError::Shape(s.to_string()))?;
        Ok(Self::new(start.parse()?, end.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_order_by_line_then_column() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 3));
    }

    #[test]
    fn reversed_span_is_normalised() {
        let span = SelectionSpan::new(Position::new(3, 2), Position::new(1, 4));
        assert_eq!(span.start, Position::new(1, 4));
        assert_eq!(span.end, Position::new(3, 2));
        assert_eq!(span.line_count(), 3);
    }

    #[test]
    fn hand_built_span_can_be_ordered() {
        let span = SelectionSpan {
            start: Position::new(0, 5),
            end: Position::new(0, 1),
        };
        let ordered = span.ordered();
        assert_eq!(ordered.start.column, 1);
        assert_eq!(ordered.end.column, 5);
        assert!(ordered.is_single_line());
    }

    #[test]
    fn parse_span() {
        let span: SelectionSpan = "2:4-5:0".parse().unwrap();
        assert_eq!(span, SelectionSpan::from_coords(2, 4, 5, 0));
        assert_eq!(span.to_string(), "2:4-5:0");
    }

    #[test]
    fn parse_span_rejects_garbage() {
        assert_eq!(
            "12".parse::<SelectionSpan>(),
            Err(ParseSpanError::Shape("12".into()))
        );
        assert_eq!(
            "1:x-2:0".parse::<SelectionSpan>(),
            Err(ParseSpanError::Number("x".into()))
        );
    }
}

//! Range resolution: selection spans to per-line char ranges.

use std::ops::Range;

use crate::document::{byte_offset, char_len, Document, Position, SelectionSpan};

use super::error::{EditError, EditResult};
use super::TextFragment;

/// A selection captured against the pristine document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub span: SelectionSpan,
    /// One fragment per line the span touches, in line order.
    pub fragments: Vec<TextFragment>,
    /// Text after the span's end column on its last line.
    pub trailing: String,
}

impl ResolvedSelection {
    /// Original line of the first fragment.
    pub fn start_line(&self) -> usize {
        self.span.start.line
    }

    /// The selected text with fragments joined by `\n`.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolve `span` to one `(line, char range)` entry per line it touches.
///
/// Single-line spans give `[start.column, end.column)`. Multi-line spans give
/// `[start.column, len)` on the first line, whole interior lines, and
/// `[0, end.column)` on the last line, which is kept even when empty.
pub fn resolve<D>(doc: &D, span: &SelectionSpan) -> EditResult<Vec<(usize, Range<usize>)>>
where
    D: Document + ?Sized,
{
    let span = span.ordered();
    let (start, end) = (span.start, span.end);

    let start_len = line_len(doc, start)?;
    check_column(start, start_len)?;

    if span.is_single_line() {
        check_column(end, start_len)?;
        return Ok(vec![(start.line, start.column..end.column)]);
    }

    let end_len = line_len(doc, end)?;
    check_column(end, end_len)?;

    let mut ranges = Vec::with_capacity(span.line_count());
    ranges.push((start.line, start.column..start_len));
    for line in start.line + 1..end.line {
        let len = line_len(doc, Position::new(line, 0))?;
        ranges.push((line, 0..len));
    }
    ranges.push((end.line, 0..end.column));
    Ok(ranges)
}

/// Resolve `span` and capture the selected text of every line.
pub fn resolve_selection<D>(doc: &D, span: &SelectionSpan) -> EditResult<ResolvedSelection>
where
    D: Document + ?Sized,
{
    let span = span.ordered();
    let ranges = resolve(doc, &span)?;

    let mut fragments = Vec::with_capacity(ranges.len());
    for (line, range) in ranges {
        let text = doc.line(line).unwrap_or_default();
        fragments.push(TextFragment {
            line,
            text: slice_chars(text, &range).to_string(),
            range,
        });
    }

    let last = doc.line(span.end.line).unwrap_or_default();
    let trailing = &last[byte_offset(last, span.end.column).unwrap_or(last.len())..];

    Ok(ResolvedSelection {
        span,
        fragments,
        trailing: trailing.to_string(),
    })
}

fn line_len<D>(doc: &D, position: Position) -> EditResult<usize>
where
    D: Document + ?Sized,
{
    doc.line(position.line)
        .map(char_len)
        .ok_or_else(|| EditError::line_out_of_bounds(position, doc.line_count()))
}

fn check_column(position: Position, line_len: usize) -> EditResult<()> {
    if position.column > line_len {
        return Err(EditError::column_out_of_bounds(position, line_len));
    }
    Ok(())
}

/// Slice `text` by a char range already checked against its length.
fn slice_chars<'a>(text: &'a str, range: &Range<usize>) -> &'a str {
    let start = byte_offset(text, range.start).unwrap_or(text.len());
    let end = byte_offset(text, range.end).unwrap_or(text.len());
    &text[start..end.max(start)]
}

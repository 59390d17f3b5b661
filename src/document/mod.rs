//! The line buffer the edit core mutates.
//!
//! The host owns its buffer; the core only needs indexed line access, so any
//! editor buffer can be adapted by implementing [`Document`]. [`LineBuffer`]
//! is the plain in-memory implementation the CLI and tests use.

pub mod span;

pub use span::{ParseSpanError, Position, SelectionSpan};

/// Indexed line access over a document.
///
/// Lines never contain line terminators. Mutating calls take indices that the
/// caller has already checked against [`Document::line_count`].
pub trait Document {
    /// Text of line `index`, or `None` past the end.
    fn line(&self, index: usize) -> Option<&str>;

    /// Replace the text of line `index`.
    fn set_line(&mut self, index: usize, text: String);

    /// Insert a line so that it becomes line `index`.
    fn insert_line(&mut self, index: usize, text: String);

    /// Remove line `index`, shifting later lines up.
    fn remove_line(&mut self, index: usize);

    fn line_count(&self) -> usize;
}

impl Document for Vec<String> {
    fn line(&self, index: usize) -> Option<&str> {
        self.get(index).map(String::as_str)
    }

    fn set_line(&mut self, index: usize, text: String) {
        self[index] = text;
    }

    fn insert_line(&mut self, index: usize, text: String) {
        self.insert(index, text);
    }

    fn remove_line(&mut self, index: usize) {
        self.remove(index);
    }

    fn line_count(&self) -> usize {
        self.len()
    }
}

/// In-memory document that remembers how its source text was terminated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineBuffer {
    lines: Vec<String>,
    line_ending: &'static str,
    trailing_newline: bool,
}

impl LineBuffer {
    /// Build from raw lines (no terminators), joined with `\n` on output.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            line_ending: "\n",
            trailing_newline: false,
        }
    }

    /// Split file contents into lines.
    ///
    /// CRLF input is written back as CRLF.
    pub fn from_text(text: &str) -> Self {
        let line_ending = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let trailing_newline = text.ends_with('\n');
        let body = text.strip_suffix('\n').unwrap_or(text);
        let body = body.strip_suffix('\r').unwrap_or(body);

        let lines = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
                .collect()
        };

        Self {
            lines,
            line_ending,
            trailing_newline,
        }
    }

    /// Join the lines back into file contents.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join(self.line_ending);
        if self.trailing_newline {
            text.push_str(self.line_ending);
        }
        text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl Document for LineBuffer {
    fn line(&self, index: usize) -> Option<&str> {
        self.lines.line(index)
    }

    fn set_line(&mut self, index: usize, text: String) {
        self.lines.set_line(index, text);
    }

    fn insert_line(&mut self, index: usize, text: String) {
        self.lines.insert_line(index, text);
    }

    fn remove_line(&mut self, index: usize) {
        self.lines.remove_line(index);
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Number of chars (columns) in `text`.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of char column `column`, or `None` when past the end.
///
/// `column == char_len(text)` maps to `text.len()`.
pub(crate) fn byte_offset(text: &str, column: usize) -> Option<usize> {
    text.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .nth(column)
}

/// The first `column` chars of `text`, clamped to its length.
pub(crate) fn char_prefix(text: &str, column: usize) -> &str {
    &text[..byte_offset(text, column).unwrap_or(text.len())]
}

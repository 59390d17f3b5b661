//! Edit core: splice formatted text back into selected ranges.
//!
//! Two phases:
//! 1. Every selection is resolved against the pristine document and run
//!    through the formatter, producing one [`ReplacementSet`] each.
//! 2. The sets are written in caller order while a running line offset
//!    translates their pre-edit line indices into current ones.
//!
//! Nothing is written until phase 1 has succeeded for every selection, so
//! any error leaves the document untouched.

pub mod error;
pub mod replace;
pub mod resolve;

use std::ops::Range;

use async_trait::async_trait;

pub use error::{EditError, EditResult};
pub use replace::{apply_replacements, plan_replacements, replace_selected, replace_selected_with, ReplacementSet};
pub use resolve::{resolve, resolve_selection, ResolvedSelection};

/// A contiguous piece of text on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    /// Line index in the document the fragment was taken from.
    pub line: usize,
    /// Char range within that line.
    pub range: Range<usize>,
    pub text: String,
}

/// Maps a selection's original fragments to replacement text.
///
/// Entry `i` of the result replaces fragment `i`. Every entry below
/// `fragments.len()` must be `Some`; extra entries become new lines, and
/// `None` among them is skipped.
#[async_trait]
pub trait Formatter: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn format(&self, fragments: &[TextFragment]) -> Result<Vec<Option<String>>, Self::Error>;
}

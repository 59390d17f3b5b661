//! `///GPT` instructions: documentation comments that ask for code.
//!
//! ```text
//! ///GPT Sort the users by signup date.
//! /// - Reference Doc: https://example.com/sorting
//! func sortUsers(_ users: [User]) -> [User] {
//! ```
//!
//! A block starts at a line whose trimmed text begins with `///GPT` and runs
//! over the following `///` lines. The first other line closes it and becomes
//! its anchor; generated code is inserted right below the anchor.

pub mod reference;

use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use crate::document::Document;

const BLOCK_START: &str = "///GPT";
const CONTINUATION: &str = "///";
const REFERENCE_MARKER: &str = "- reference doc:";

#[derive(Debug, Error)]
pub enum InstructionError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reference doc {0} is not valid UTF-8")]
    Decode(String),
}

/// One `///GPT` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub lines: Vec<String>,
    /// Line that closed the block, or the last line at end of document.
    pub anchor: usize,
    pub reference_url: Option<Url>,
}

impl Instruction {
    /// The block's lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Collect every instruction block, top to bottom.
pub fn extract_instructions<D>(doc: &D) -> Vec<Instruction>
where
    D: Document + ?Sized,
{
    let mut instructions = Vec::new();
    let mut current: Option<Instruction> = None;

    for index in 0..doc.line_count() {
        let line = doc.line(index).unwrap_or_default();
        let trimmed = line.trim();

        if trimmed.starts_with(BLOCK_START) {
            // A new block header directly after another continues the same block.
            current
                .get_or_insert_with(|| Instruction {
                    lines: Vec::new(),
                    anchor: index,
                    reference_url: None,
                })
                .lines
                .push(line.to_string());
        } else if let Some(block) = current.as_mut().filter(|_| trimmed.starts_with(CONTINUATION)) {
            block.lines.push(line.to_string());
            if let Some(url) = reference_url(line) {
                block.reference_url = Some(url);
            }
        } else if let Some(mut block) = current.take() {
            block.anchor = index;
            instructions.push(block);
        }
    }

    if let Some(mut block) = current {
        block.anchor = doc.line_count().saturating_sub(1);
        instructions.push(block);
    }

    debug!(count = instructions.len(), "extracted instructions");
    instructions
}

/// URL after a case-insensitive `- Reference Doc:` marker, if it parses.
fn reference_url(line: &str) -> Option<Url> {
    let lower = line.to_ascii_lowercase();
    let start = lower.find(REFERENCE_MARKER)? + REFERENCE_MARKER.len();
    Url::parse(line[start..].trim()).ok()
}

/// Insert each `(anchor, lines)` response below its anchor line.
///
/// Responses are applied bottom-up so anchors, which index the document
/// before any insertion, stay valid.
pub fn insert_responses<D>(doc: &mut D, mut responses: Vec<(usize, Vec<String>)>)
where
    D: Document + ?Sized,
{
    responses.sort_by(|a, b| b.0.cmp(&a.0));
    for (anchor, lines) in responses {
        let at = (anchor + 1).min(doc.line_count());
        for (offset, line) in lines.into_iter().enumerate() {
            doc.insert_line(at + offset, line);
        }
    }
}

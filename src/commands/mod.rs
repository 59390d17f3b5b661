//! Editor commands, i.e. what the plugin's menu entries do to a document.
//!
//! - replace: rewrite each selection in place with the model's reply
//! - create: generate code from the selected request, below the selection
//! - instruct: generate code for every `///GPT` block, below its anchor

pub mod file;

use thiserror::Error;
use tracing::{info, warn};

use crate::document::{Document, SelectionSpan};
use crate::edit::{replace_selected_with, resolve_selection, EditError};
use crate::instruction::reference::ReferenceSource;
use crate::instruction::{extract_instructions, insert_responses};
use crate::llm::prompts::{create_prompt, instruction_prompt};
use crate::llm::{CompletionError, CompletionFormatter, CompletionProvider};

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("selection {0} is empty")]
    EmptySelection(SelectionSpan),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// Rewrite every span with the provider's reply. Returns the net line change.
pub async fn replace_selection<D, P>(
    doc: &mut D,
    spans: &[SelectionSpan],
    provider: &P,
    language: &str,
    instruction: Option<String>,
) -> CommandResult<isize>
where
    D: Document + ?Sized,
    P: CompletionProvider + ?Sized,
{
    let formatter = CompletionFormatter::new(provider, language).with_instruction(instruction);
    let delta = replace_selected_with(doc, spans, &formatter).await?;
    info!(selections = spans.len(), delta, "replaced selections");
    Ok(delta)
}

/// Send the selected text as a request and insert the generated code below
/// the selection. Returns the number of inserted lines.
pub async fn create_from_selection<D, P>(
    doc: &mut D,
    span: &SelectionSpan,
    provider: &P,
    language: &str,
) -> CommandResult<usize>
where
    D: Document + ?Sized,
    P: CompletionProvider + ?Sized,
{
    let selection = resolve_selection(&*doc, span)?;
    let request = selection.text();
    let request = request.trim();
    if request.is_empty() {
        return Err(CommandError::EmptySelection(selection.span));
    }

    let lines = provider.complete(&create_prompt(language, request)).await?;
    let inserted = lines.len();
    insert_responses(doc, vec![(selection.span.end.line, lines)]);
    info!(inserted, "created code from selection");
    Ok(inserted)
}

const REFERENCE_PREFIX: &str = "\nThis is the contents of the Reference Doc URL: ";

/// Generate code for every `///GPT` block. Returns the number of inserted lines.
///
/// All blocks are answered before the document is touched.
pub async fn create_from_instructions<D, P, R>(
    doc: &mut D,
    provider: &P,
    references: &R,
    language: &str,
) -> CommandResult<usize>
where
    D: Document + ?Sized,
    P: CompletionProvider + ?Sized,
    R: ReferenceSource + ?Sized,
{
    let instructions = extract_instructions(&*doc);
    let mut responses = Vec::with_capacity(instructions.len());

    for instruction in &instructions {
        let mut text = instruction.text();
        if let Some(url) = &instruction.reference_url {
            match references.fetch(url).await {
                Ok(contents) => {
                    text.push_str(REFERENCE_PREFIX);
                    text.push_str(&contents);
                }
                Err(e) => warn!("skipping reference doc: {e}"),
            }
        }

        let lines = provider.complete(&instruction_prompt(language, &text)).await?;
        responses.push((instruction.anchor, lines));
    }

    let inserted = responses.iter().map(|(_, lines)| lines.len()).sum();
    insert_responses(doc, responses);
    info!(blocks = instructions.len(), inserted, "answered instructions");
    Ok(inserted)
}

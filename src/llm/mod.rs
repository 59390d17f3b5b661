//! Completion layer, the language-model side of the plugin.
//!
//! [`CompletionProvider`] is the seam the editor commands talk to; [`ChatClient`]
//! is the HTTP implementation. [`CompletionFormatter`] adapts a provider to the
//! edit core's [`Formatter`] so a selection can be rewritten in place.

pub mod client;
pub mod prompts;
pub mod types;

use async_trait::async_trait;
use tracing::debug;

pub use client::{ChatClient, CompletionError};

use crate::edit::{Formatter, TextFragment};

/// Turns a prompt into lines of generated text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Vec<String>, CompletionError>;
}

/// Rewrites each selection by sending its text to a completion provider.
///
/// The reply's lines replace the selection's lines one for one, with extra
/// lines inserted and missing ones removed by the edit core.
pub struct CompletionFormatter<'a, P: ?Sized> {
    provider: &'a P,
    language: String,
    instruction: Option<String>,
}

impl<'a, P> CompletionFormatter<'a, P>
where
    P: CompletionProvider + ?Sized,
{
    pub fn new(provider: &'a P, language: &str) -> Self {
        Self {
            provider,
            language: language.to_string(),
            instruction: None,
        }
    }

    pub fn with_instruction(mut self, instruction: Option<String>) -> Self {
        self.instruction = instruction;
        self
    }
}

#[async_trait]
impl<'a, P> Formatter for CompletionFormatter<'a, P>
where
    P: CompletionProvider + ?Sized,
{
    type Error = CompletionError;

    async fn format(&self, fragments: &[TextFragment]) -> Result<Vec<Option<String>>, CompletionError> {
        let code = fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = prompts::rewrite_prompt(&self.language, self.instruction.as_deref(), &code);

        let lines = self.provider.complete(&prompt).await?;
        debug!(
            original = fragments.len(),
            replacement = lines.len(),
            "selection formatted"
        );
        Ok(lines.into_iter().map(Some).collect())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedProvider;
    use super::*;
    use crate::document::{LineBuffer, SelectionSpan};
    use crate::edit::{replace_selected_with, EditError};

    #[tokio::test]
    async fn formatter_sends_joined_selection() {
        let provider = ScriptedProvider::new().reply(&["let a = 1;", "let b = 2;"]);
        let formatter = CompletionFormatter::new(&provider, "rust");
        let mut doc = LineBuffer::from_lines(["fn main() {", "    let a=1;let b=2;", "}"]);

        let delta = replace_selected_with(&mut doc, &[SelectionSpan::from_coords(1, 4, 1, 20)], &formatter)
            .await
            .unwrap();

        assert_eq!(delta, 1);
        assert_eq!(doc.lines(), ["fn main() {", "    let a = 1;", "let b = 2;", "}"]);
        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("let a=1;let b=2;"));
    }

    #[tokio::test]
    async fn formatter_passes_instruction() {
        let provider = ScriptedProvider::new().reply(&["x"]);
        let formatter = CompletionFormatter::new(&provider, "swift")
            .with_instruction(Some("Rename everything to x.".into()));
        let fragments = vec![TextFragment {
            line: 0,
            range: 0..1,
            text: "y".into(),
        }];

        let out = formatter.format(&fragments).await.unwrap();
        assert_eq!(out, vec![Some("x".to_string())]);
        assert!(provider.prompts()[0].contains("Rename everything to x."));
    }

    #[tokio::test]
    async fn provider_error_aborts_without_edits() {
        let provider = ScriptedProvider::new()
            .reply(&["ok"])
            .fail(CompletionError::Auth("bad key".into()));
        let formatter = CompletionFormatter::new(&provider, "rust");
        let mut doc = LineBuffer::from_lines(["one", "two"]);
        let before = doc.clone();

        let err = replace_selected_with(
            &mut doc,
            &[SelectionSpan::from_coords(0, 0, 0, 3), SelectionSpan::from_coords(1, 0, 1, 3)],
            &formatter,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, EditError::Formatter(_)));
        assert!(err.to_string().contains("bad key"));
        assert_eq!(doc, before);
    }
}

//! GPTComplete: splice language-model completions into an editor buffer.
//!
//! The edit core resolves selections to per-line ranges and writes formatted
//! replacements back, inserting or removing lines while keeping later
//! selections' line indices valid. Around it sit the completion client, the
//! credential store, and the `///GPT` instruction handling.

pub mod commands;
pub mod config;
pub mod document;
pub mod edit;
pub mod instruction;
pub mod keystore;
pub mod llm;

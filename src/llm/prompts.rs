//! Prompt templates for the three editor commands.
//!
//! Every template ends with the same instruction to answer with bare code,
//! since the reply is spliced straight into the buffer.

/// Appended to every prompt.
pub const CODE_ONLY: &str = "\
Only return the code itself, do not return it in a code block, do not provide an explanation, \
do not include an opening and closing ```, do not provide an implementation detail, \
only provide the code requested";

/// Default instruction for `replace` when the user gives none.
pub const DEFAULT_REWRITE_INSTRUCTION: &str = "Format and improve it.";

/// Prompt for rewriting a selection in place.
pub fn rewrite_prompt(language: &str, instruction: Option<&str>, code: &str) -> String {
    let instruction = instruction
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .unwrap_or(DEFAULT_REWRITE_INSTRUCTION);
    format!(
        "Rewrite the following {language} code. {instruction} \
         Keep the same number of lines unless the change requires otherwise. {CODE_ONLY}.\n\n{code}"
    )
}

/// Prompt for generating code from a selected request.
pub fn create_prompt(language: &str, request: &str) -> String {
    format!("in {language}: {request}. {CODE_ONLY}")
}

/// Prompt for generating code from a `///GPT` documentation block.
pub fn instruction_prompt(language: &str, documentation: &str) -> String {
    format!(
        "This is a {language} documentation: {documentation}. Use it to generate the appropriate \
         {language} code implementation. {CODE_ONLY}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_uses_default_instruction() {
        let prompt = rewrite_prompt("swift", None, "let x=1");
        assert!(prompt.starts_with("Rewrite the following swift code. Format and improve it."));
        assert!(prompt.ends_with("\n\nlet x=1"));
    }

    #[test]
    fn rewrite_blank_instruction_falls_back() {
        let prompt = rewrite_prompt("rust", Some("   "), "x");
        assert!(prompt.contains(DEFAULT_REWRITE_INSTRUCTION));
    }

    #[test]
    fn rewrite_custom_instruction() {
        let prompt = rewrite_prompt("rust", Some("Add doc comments."), "fn a() {}");
        assert!(prompt.contains("Add doc comments."));
        assert!(!prompt.contains(DEFAULT_REWRITE_INSTRUCTION));
    }

    #[test]
    fn create_prompt_names_language() {
        let prompt = create_prompt("swift", "a function that adds two ints");
        assert!(prompt.starts_with("in swift: a function that adds two ints. Only return the code"));
    }

    #[test]
    fn instruction_prompt_embeds_documentation() {
        let prompt = instruction_prompt("swift", "///GPT sort the array");
        assert!(prompt.contains("This is a swift documentation: ///GPT sort the array."));
        assert!(prompt.contains("appropriate swift code implementation"));
    }
}

//! Prompt builder: fixed instruction template with a context and a query slot.

use std::fmt;

/// Placeholder replaced by the joined fragment texts.
pub const CONTEXT_SLOT: &str = "{context}";
/// Placeholder replaced by the user's question.
pub const QUERY_SLOT: &str = "{query}";

const HEAD: &str = "Use the following pieces of information to answer the user's query.\n\
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
\n\
Context: ";
const MIDDLE: &str = "\nQuery: ";
const TAIL: &str = "\n\nOnly return the helpful answer below and nothing else.\nHelpful answer:\n";

/// Separator between fragments in the context slot.
pub const FRAGMENT_SEPARATOR: &str = "\n\n";

/// The template text with both slots unfilled.
pub fn template() -> String {
    format!("{HEAD}{CONTEXT_SLOT}{MIDDLE}{QUERY_SLOT}{TAIL}")
}

/// Fully rendered prompt text. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders the template.
///
/// Substitution is literal and single-pass: slot markers that appear inside
/// the context or the query are left as they are.
///
/// # Example
/// ```
/// use qa_pipeline::PromptBuilder;
/// let p = PromptBuilder.build("Aspirin is an NSAID.", "What is aspirin?");
/// assert!(p.as_str().contains("Context: Aspirin is an NSAID.\nQuery: What is aspirin?"));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(&self, context: &str, query: &str) -> Prompt {
        let mut out =
            String::with_capacity(HEAD.len() + context.len() + MIDDLE.len() + query.len() + TAIL.len());
        out.push_str(HEAD);
        out.push_str(context);
        out.push_str(MIDDLE);
        out.push_str(query);
        out.push_str(TAIL);
        Prompt(out)
    }
}

/// "Stuff" strategy: every fragment text, in ranking order, separated by a blank line.
pub fn join_fragments<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    texts.into_iter().collect::<Vec<_>>().join(FRAGMENT_SEPARATOR)
}

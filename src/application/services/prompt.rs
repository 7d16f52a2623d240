use crate::domain::{count_tokens, ChatTurn, Conversation, SearchResult};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant answering questions about \
the documents the user uploaded. Answer only from the provided context. If the context does not \
contain the answer, say so.";

pub const DEFAULT_NO_CONTEXT: &str = "No relevant passages were found in the uploaded documents.";

/// Assembles the model prompt from retrieved context, history and the question.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    system: String,
    no_context: String,
}

impl PromptBuilder {
    pub fn new(system: impl Into<String>, no_context: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            no_context: no_context.into(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn build(&self, question: &str, context: &[SearchResult], history: &[&ChatTurn]) -> String {
        let mut prompt = String::from("Context from the uploaded documents:\n");

        if context.is_empty() {
            prompt.push_str(&self.no_context);
            prompt.push('\n');
        }
        for (i, result) in context.iter().enumerate() {
            prompt.push_str(&format!(
                "[{}] ({}, part {})\n{}\n",
                i + 1,
                result.chunk.document_name,
                result.chunk.chunk_index + 1,
                result.chunk.content.trim_end()
            ));
        }

        if !history.is_empty() {
            let lines = history
                .iter()
                .map(|t| format!("{}: {}", t.role.as_str(), t.text))
                .collect::<Vec<_>>()
                .join("\n");
            prompt.push_str(&format!("\nPrevious conversation:\n{lines}\n"));
        }

        prompt.push_str(&format!("\nCurrent question from user: {question}"));
        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT, DEFAULT_NO_CONTEXT)
    }
}

/// Picks the most recent answered exchanges that fit both limits.
///
/// Whole question/answer pairs are taken newest first and stop at the first
/// pair that would exceed `max_turns` (counted per turn, so two per pair) or
/// `token_budget`. The result is in
/// chronological order. Failed and pending questions never appear.
pub fn select_history(
    conversation: &Conversation,
    max_turns: usize,
    token_budget: usize,
) -> Vec<&ChatTurn> {
    let mut selected = Vec::new();
    let mut tokens = 0;

    for (question, answer) in conversation.answered_exchanges().into_iter().rev() {
        let cost = count_tokens(&question.text) + count_tokens(&answer.text);
        if selected.len() + 2 > max_turns || tokens + cost > token_budget {
            break;
        }
        tokens += cost;
        selected.push(answer);
        selected.push(question);
    }

    selected.reverse();
    selected
}

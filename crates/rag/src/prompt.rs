//! Question-answering prompt rendering.

use handlebars::Handlebars;
use sabaq_core::{AppError, AppResult};

/// Template for the extractive QA prompt handed to the generation worker.
const QA_PROMPT_TEMPLATE: &str = "\nContext: {{context}}\n\nQuestion: {{question}}\n\nAnswer:";

/// Render the QA prompt for a context/question pair.
pub fn render_qa_prompt(context: &str, question: &str) -> AppResult<String> {
    let mut handlebars = Handlebars::new();
    // Context and question are raw text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .render_template(
            QA_PROMPT_TEMPLATE,
            &serde_json::json!({
                "context": context,
                "question": question,
            }),
        )
        .map_err(|e| AppError::Generation(format!("Failed to render QA prompt: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_qa_prompt() {
        let prompt = render_qa_prompt("The mitochondria is the powerhouse", "What is it?").unwrap();
        assert!(prompt.contains("Context: The mitochondria is the powerhouse"));
        assert!(prompt.contains("Question: What is it?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_render_does_not_escape() {
        let prompt = render_qa_prompt("a < b & c > d", "compare?").unwrap();
        assert!(prompt.contains("a < b & c > d"));
    }
}

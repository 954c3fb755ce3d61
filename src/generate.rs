//! Grounded answer generation from retrieved KB snippets.

use crate::error::{KbEvalError, Result};
use crate::eval::RetrievedItem;
use crate::judge::Judge;
use async_trait::async_trait;
use std::sync::Arc;

/// Produces an answer to a question from retrieved snippets.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, items: &[RetrievedItem]) -> Result<String>;
}

/// Build the support-assistant prompt with numbered `[Source i]` blocks.
pub fn answer_prompt(question: &str, items: &[RetrievedItem]) -> String {
    let context = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[Source {}]\n{}", i + 1, item.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an IT infrastructure support assistant. Answer the user's question based ONLY on the provided knowledge base articles.

QUESTION: {question}

KNOWLEDGE BASE ARTICLES:
{context}

INSTRUCTIONS:
1. Provide a clear, step-by-step answer based on the KB articles
2. If the KB doesn't fully answer the question, say so clearly
3. Reference which source(s) you used (e.g., \"According to Source 1...\")
4. Be concise but complete
5. Do not hallucinate

ANSWER:"
    )
}

/// Answer generator over any chat model, sharing the judge transport.
pub struct LlmAnswerGenerator {
    model: Arc<dyn Judge>,
}

impl LlmAnswerGenerator {
    pub fn new(model: Arc<dyn Judge>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(&self, question: &str, items: &[RetrievedItem]) -> Result<String> {
        let start = std::time::Instant::now();
        let answer = self
            .model
            .chat(&answer_prompt(question, items))
            .await
            .map_err(|e| KbEvalError::Generation(e.to_string()))?;
        log::debug!("Answer generation took {:?}", start.elapsed());
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::testing::{FailingJudge, ScriptedJudge};

    #[test]
    fn test_answer_prompt_numbers_sources() {
        let items = vec![
            RetrievedItem::new("Restart the Health Service.", 0.9),
            RetrievedItem::new("Open port 5723.", 0.7),
        ];
        let prompt = answer_prompt("Why no heartbeats?", &items);
        assert!(prompt.contains("QUESTION: Why no heartbeats?"));
        assert!(prompt.contains("[Source 1]\nRestart the Health Service.\n\n[Source 2]\nOpen port 5723."));
        assert!(prompt.ends_with("ANSWER:"));
    }

    #[tokio::test]
    async fn test_generate_trims_reply() {
        let generator = LlmAnswerGenerator::new(Arc::new(ScriptedJudge::new(|_| {
            "  According to Source 1, restart the service.\n".to_string()
        })));
        let answer = generator.generate("q", &[]).await.unwrap();
        assert_eq!(answer, "According to Source 1, restart the service.");
    }

    #[tokio::test]
    async fn test_generate_failure_is_generation_error() {
        let generator = LlmAnswerGenerator::new(Arc::new(FailingJudge));
        let err = generator.generate("q", &[]).await.unwrap_err();
        assert!(matches!(err, KbEvalError::Generation(_)));
    }
}

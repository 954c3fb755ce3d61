//! Context relevancy: share of retrieved sentences the judge calls relevant.

use crate::error::Result;
use crate::eval::parse::{count_numeric_tokens, count_sentences, is_none_sentinel};
use crate::eval::types::{round3, RetrievedItem};
use crate::judge::{joined_context, JudgeInvoker};

fn relevancy_prompt(question: &str, context: &str) -> String {
    format!(
        "Given this question and retrieved documents, identify which sentences are relevant to answering the question.

QUESTION: {question}

RETRIEVED DOCUMENTS:
{context}

TASK: List ONLY the sentence numbers that are relevant to answering the question. If a document has no relevant sentences, skip it.

Format: Just list numbers like: 1, 3, 5, 7
If nothing is relevant, respond with: NONE
"
    )
}

/// Score in [0, 1]: relevant sentences / total sentences, capped at 1.0.
///
/// Returns 0.0 without calling the judge when the retrieved text has no sentences.
pub async fn context_relevancy(
    judge: &JudgeInvoker,
    question: &str,
    items: &[RetrievedItem],
) -> Result<f64> {
    let total_sentences: usize = items.iter().map(|item| count_sentences(&item.text)).sum();
    if total_sentences == 0 {
        log::debug!("Context relevancy: no sentences in retrieved text");
        return Ok(0.0);
    }

    let reply = judge
        .invoke(&relevancy_prompt(question, &joined_context(items)))
        .await?;

    let relevant_count = if is_none_sentinel(&reply) {
        0
    } else {
        count_numeric_tokens(&reply)
    };

    let score = (relevant_count as f64 / total_sentences as f64).min(1.0);
    log::debug!(
        "Context relevancy: {}/{} sentences relevant",
        relevant_count,
        total_sentences
    );
    Ok(round3(score))
}

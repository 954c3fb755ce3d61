//! Precision at K judged per item by the LLM.

use crate::error::Result;
use crate::eval::parse::is_relevant_verdict;
use crate::eval::types::{round3, PrecisionDetail, PrecisionResult, RetrievedItem};
use crate::judge::JudgeInvoker;
use futures_util::future::try_join_all;

fn item_relevance_prompt(question: &str, text: &str) -> String {
    format!(
        "Is this KB document relevant for answering the user's question?

QUESTION: {question}

KB DOCUMENT:
{text}

Respond with ONLY one word: RELEVANT or NOT_RELEVANT
"
    )
}

/// Precision at K: proportion of the first `k` items (in retrieval order) judged relevant.
///
/// One judge call per item, issued concurrently. The denominator is always
/// `k`, so fewer than `k` retrieved items pull the score down. If k is 0,
/// returns 0.0.
pub async fn precision_at_k(
    judge: &JudgeInvoker,
    question: &str,
    items: &[RetrievedItem],
    k: usize,
) -> Result<PrecisionResult> {
    if k == 0 {
        return Ok(PrecisionResult {
            precision_score: 0.0,
            relevant_count: 0,
            total_evaluated: 0,
            details: Vec::new(),
        });
    }

    let verdicts = items.iter().take(k).enumerate().map(|(i, item)| async move {
        let reply = judge
            .invoke(&item_relevance_prompt(question, &item.text))
            .await?;
        Ok::<_, crate::error::KbEvalError>(PrecisionDetail {
            doc_num: i + 1,
            score: item.score,
            relevant: is_relevant_verdict(&reply),
        })
    });
    // try_join_all keeps input order
    let details = try_join_all(verdicts).await?;

    let relevant_count = details.iter().filter(|d| d.relevant).count();
    Ok(PrecisionResult {
        precision_score: round3(relevant_count as f64 / k as f64),
        relevant_count,
        total_evaluated: k,
        details,
    })
}

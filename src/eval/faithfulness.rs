//! Faithfulness: whether a text's claims are backed by the retrieved sources.

use crate::error::Result;
use crate::eval::parse::{label_pattern, labeled_score};
use crate::eval::types::{round3, JudgedScore, RetrievedItem};
use crate::judge::{joined_context, JudgeInvoker};
use regex::Regex;
use std::sync::OnceLock;

pub const FAITHFULNESS_LABEL: &str = "FAITHFULNESS_SCORE";

/// Optimistic fallback: a text is assumed faithful unless the judge scores it lower.
pub const DEFAULT_FAITHFULNESS: f64 = 0.8;

fn faithfulness_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| label_pattern(FAITHFULNESS_LABEL))
}

fn faithfulness_prompt(text: &str, context: &str) -> String {
    format!(
        "You are checking if an AI's response is faithful to source documents (no hallucination).

AI'S EVALUATION/RESPONSE:
{text}

SOURCE KB DOCUMENTS:
{context}

TASK:
1. Extract all factual claims/statements from the AI's response
2. For each claim, check if it can be verified in the source documents
3. Calculate faithfulness score

Format your response EXACTLY like this:
CLAIMS:
1. [claim] - [VERIFIED/NOT_VERIFIED]
2. [claim] - [VERIFIED/NOT_VERIFIED]

{FAITHFULNESS_LABEL}: X.XX (0.0 to 1.0)
"
    )
}

/// Check `text` against the retrieved items as ground truth.
///
/// The judge's number is clamped to `[0, 1]`.
pub async fn faithfulness(
    judge: &JudgeInvoker,
    text: &str,
    items: &[RetrievedItem],
) -> Result<JudgedScore> {
    let reply = judge
        .invoke(&faithfulness_prompt(text, &joined_context(items)))
        .await?;

    let (score, defaulted) = match labeled_score(&reply, faithfulness_pattern()) {
        Some(score) => (score, false),
        None => {
            log::warn!(
                "Faithfulness judge reply had no {}; using {}",
                FAITHFULNESS_LABEL,
                DEFAULT_FAITHFULNESS
            );
            (DEFAULT_FAITHFULNESS, true)
        }
    };

    Ok(JudgedScore {
        score: round3(score.clamp(0.0, 1.0)),
        breakdown: reply,
        defaulted,
    })
}

//! Answer completeness: how much of the question the retrieved text can answer.

use crate::error::Result;
use crate::eval::parse::{label_pattern, labeled_score};
use crate::eval::types::{round3, JudgedScore, RetrievedItem};
use crate::judge::{joined_context, JudgeInvoker};
use regex::Regex;
use std::sync::OnceLock;

pub const COMPLETENESS_LABEL: &str = "COMPLETENESS_SCORE";

/// Neutral fallback when the judge reply carries no score.
pub const DEFAULT_COMPLETENESS: f64 = 0.5;

fn completeness_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| label_pattern(COMPLETENESS_LABEL))
}

fn completeness_prompt(question: &str, context: &str) -> String {
    format!(
        "You are evaluating if retrieved KB documents can completely answer a user's question.

QUESTION: {question}

RETRIEVED KB DOCUMENTS:
{context}

TASK:
1. Break the question into 3-5 sub-questions that need to be answered
2. For each sub-question, determine if the KB documents provide an answer
3. Provide a completeness score

Format your response EXACTLY like this:
SUB-QUESTIONS:
1. [sub-question] - [ANSWERED/PARTIAL/NOT_ANSWERED]
2. [sub-question] - [ANSWERED/PARTIAL/NOT_ANSWERED]
3. [sub-question] - [ANSWERED/PARTIAL/NOT_ANSWERED]

{COMPLETENESS_LABEL}: X.XX (0.0 to 1.0)
"
    )
}

/// Ask the judge to decompose the question and score coverage.
///
/// The judge's number is passed through unclamped; only rounding is applied.
pub async fn answer_completeness(
    judge: &JudgeInvoker,
    question: &str,
    items: &[RetrievedItem],
) -> Result<JudgedScore> {
    let reply = judge
        .invoke(&completeness_prompt(question, &joined_context(items)))
        .await?;

    let (score, defaulted) = match labeled_score(&reply, completeness_pattern()) {
        Some(score) => (score, false),
        None => {
            log::warn!(
                "Completeness judge reply had no {}; using {}",
                COMPLETENESS_LABEL,
                DEFAULT_COMPLETENESS
            );
            (DEFAULT_COMPLETENESS, true)
        }
    };

    Ok(JudgedScore {
        score: round3(score),
        breakdown: reply,
        defaulted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::testing::ScriptedJudge;

    fn items() -> Vec<RetrievedItem> {
        vec![RetrievedItem::new("Restart the Health Service.", 0.9)]
    }

    #[tokio::test]
    async fn test_completeness_parses_score_and_keeps_breakdown() {
        let reply = "SUB-QUESTIONS:\n1. What stops heartbeats? - PARTIAL\n\nCOMPLETENESS_SCORE: 0.6666";
        let judge = ScriptedJudge::invoker(move |_| reply.to_string());
        let result = answer_completeness(&judge, "q", &items()).await.unwrap();
        assert_eq!(result.score, 0.667);
        assert!(!result.defaulted);
        assert!(result.breakdown.contains("PARTIAL"));
    }

    #[tokio::test]
    async fn test_completeness_defaults_on_missing_label() {
        let judge = ScriptedJudge::invoker(|_| "I think it's mostly answered.".to_string());
        let result = answer_completeness(&judge, "q", &items()).await.unwrap();
        assert_eq!(result.score, DEFAULT_COMPLETENESS);
        assert!(result.defaulted);
    }

    #[tokio::test]
    async fn test_completeness_passes_out_of_range_value_through() {
        // not clamped: the judge's value is reported as-is
        let judge = ScriptedJudge::invoker(|_| "COMPLETENESS_SCORE: 1.5".to_string());
        let result = answer_completeness(&judge, "q", &items()).await.unwrap();
        assert_eq!(result.score, 1.5);
    }

    #[tokio::test]
    async fn test_completeness_prompt_requests_label() {
        let judge = ScriptedJudge::invoker(|prompt| {
            assert!(prompt.contains("COMPLETENESS_SCORE: X.XX"));
            assert!(prompt.contains("Restart the Health Service."));
            "COMPLETENESS_SCORE: 0.8".to_string()
        });
        let result = answer_completeness(&judge, "q", &items()).await.unwrap();
        assert_eq!(result.score, 0.8);
    }

    #[tokio::test]
    async fn test_completeness_reads_score_with_trailing_period() {
        let judge = ScriptedJudge::invoker(|_| "COMPLETENESS_SCORE: 0.95.".to_string());
        let result = answer_completeness(&judge, "q", &items()).await.unwrap();
        assert_eq!(result.score, 0.95);
        assert!(!result.defaulted);
    }
}

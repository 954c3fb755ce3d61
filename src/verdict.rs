//! KB coverage verdict: can the retrieved articles answer the question at all?

use crate::error::Result;
use crate::eval::RetrievedItem;
use crate::judge::JudgeInvoker;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coverage {
    Complete,
    Partial,
    Missing,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unknown,
}

/// Parsed verdict. `raw` is the judge's full reply and is what gets graded for faithfulness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbVerdict {
    pub verdict: Coverage,
    pub confidence: Confidence,
    pub explanation: String,
    pub gaps: String,
    pub raw: String,
}

fn verdict_prompt(question: &str, items: &[RetrievedItem]) -> String {
    let context = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[Snippet {}] (Score: {:.3})\n{}", i + 1, item.score, item.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a knowledge base quality evaluator for IT infrastructure troubleshooting documentation.

USER QUESTION:
{question}

RETRIEVED KB ARTICLES:
{context}

TASK:
Evaluate if the retrieved KB articles contain sufficient information to answer the user's question completely.

Provide your evaluation in this format:
VERDICT: [Complete/Partial/Missing]
CONFIDENCE: [High/Medium/Low]
EXPLANATION: [Brief explanation of why this verdict]
GAPS: [What information is missing, if any]
"
    )
}

/// Value after `FIELD:` on the first line that starts with it (case-insensitive, markdown bold tolerated).
fn field<'a>(reply: &'a str, name: &str) -> Option<&'a str> {
    reply.lines().find_map(|line| {
        let line = line.trim().trim_start_matches('*');
        let (key, value) = line.split_once(':')?;
        if key.trim_end_matches('*').trim().eq_ignore_ascii_case(name) {
            Some(value.trim().trim_start_matches('*').trim())
        } else {
            None
        }
    })
}

fn first_word_lower(value: Option<&str>) -> String {
    value
        .and_then(|v| v.split(|c: char| !c.is_alphabetic()).find(|w| !w.is_empty()))
        .unwrap_or_default()
        .to_lowercase()
}

/// Parse a verdict reply; fields that are missing or unrecognised become `Unknown` or empty.
pub fn parse_verdict(reply: &str) -> KbVerdict {
    let verdict = match first_word_lower(field(reply, "VERDICT")).as_str() {
        "complete" => Coverage::Complete,
        "partial" => Coverage::Partial,
        "missing" => Coverage::Missing,
        _ => Coverage::Unknown,
    };
    let confidence = match first_word_lower(field(reply, "CONFIDENCE")).as_str() {
        "high" => Confidence::High,
        "medium" => Confidence::Medium,
        "low" => Confidence::Low,
        _ => Confidence::Unknown,
    };
    if verdict == Coverage::Unknown {
        log::warn!("KB verdict reply had no recognisable VERDICT line");
    }

    KbVerdict {
        verdict,
        confidence,
        explanation: field(reply, "EXPLANATION").unwrap_or_default().to_string(),
        gaps: field(reply, "GAPS").unwrap_or_default().to_string(),
        raw: reply.to_string(),
    }
}

/// Ask the judge whether the retrieved articles cover the question.
pub async fn assess_coverage(
    judge: &JudgeInvoker,
    question: &str,
    items: &[RetrievedItem],
) -> Result<KbVerdict> {
    let reply = judge.invoke(&verdict_prompt(question, items)).await?;
    Ok(parse_verdict(&reply))
}

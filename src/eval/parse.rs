//! Tolerant parsing of judge replies.
//!
//! Judges are unreliable formatters. Nothing here fails: a reply that does not
//! carry the expected shape yields `None` or a zero count and the scorer applies
//! its own default.

use regex::Regex;
use std::sync::OnceLock;

/// Characters treated as sentence ends when counting sentences.
const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Reply the relevancy judge gives when no sentence is relevant.
pub const NONE_SENTINEL: &str = "NONE";

/// Count sentences in `text` by splitting on terminators and discarding blank segments.
pub fn count_sentences(text: &str) -> usize {
    text.split(SENTENCE_TERMINATORS.as_slice())
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Number of integer tokens in the reply. Duplicates and out-of-range indices count too.
pub fn count_numeric_tokens(reply: &str) -> usize {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER
        .get_or_init(|| Regex::new(r"\d+").expect("Invalid regex pattern"))
        .find_iter(reply)
        .count()
}

/// True when the whole reply is the `NONE` sentinel.
pub fn is_none_sentinel(reply: &str) -> bool {
    reply.trim().eq_ignore_ascii_case(NONE_SENTINEL)
}

/// Compile the pattern for `LABEL: <number>`, tolerating markdown bold around label and colon.
///
/// Build once per label; see [`labeled_score`].
pub fn label_pattern(label: &str) -> Regex {
    let pattern = format!(r"{}\**\s*:\s*\**\s*(\.?\d[\d.]*)", regex::escape(label));
    Regex::new(&pattern).expect("Invalid regex pattern")
}

/// Extract the float matched by a [`label_pattern`]; `None` when the label is missing or the number is garbage.
///
/// A sentence-final period after the number is ignored.
pub fn labeled_score(reply: &str, pattern: &Regex) -> Option<f64> {
    let caps = pattern.captures(reply)?;
    caps.get(1)?
        .as_str()
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
}

/// Binary relevance verdict: contains `RELEVANT` but not `NOT_RELEVANT`.
pub fn is_relevant_verdict(reply: &str) -> bool {
    let upper = reply.trim().to_uppercase();
    upper.contains("RELEVANT") && !upper.contains("NOT_RELEVANT")
}

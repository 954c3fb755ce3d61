//! Records produced by an evaluation run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One knowledge snippet returned by vector search, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedItem {
    pub text: String,
    pub score: f32,
}

impl RetrievedItem {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Score plus the raw judge text it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgedScore {
    pub score: f64,
    pub breakdown: String,
    /// True when the judge reply lacked a usable score and the policy default was used.
    #[serde(default)]
    pub defaulted: bool,
}

/// Relevance verdict for one of the top-k retrieved items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionDetail {
    /// 1-based position in retrieval order.
    pub doc_num: usize,
    /// Similarity score from the vector search.
    pub score: f32,
    pub relevant: bool,
}

/// Precision-at-k outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionResult {
    pub precision_score: f64,
    pub relevant_count: usize,
    /// Always the configured k, even when fewer items were retrieved.
    pub total_evaluated: usize,
    pub details: Vec<PrecisionDetail>,
}

/// The four metric scores for one question plus their audit trails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub context_relevancy: f64,
    pub answer_completeness: f64,
    pub faithfulness: f64,
    pub precision_at_3: f64,
    pub completeness_breakdown: String,
    pub faithfulness_breakdown: String,
    pub precision_details: Vec<PrecisionDetail>,
}

/// Full evaluation record for one question. Built once by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEvaluation {
    pub question: String,
    pub retrieved_items: Vec<RetrievedItem>,
    pub generated_answer: String,
    pub metrics: Metrics,
    pub overall_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Coarse traffic-light band for displaying a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityBand {
    Good,
    Fair,
    Weak,
    Poor,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            QualityBand::Good
        } else if score >= 0.6 {
            QualityBand::Fair
        } else if score >= 0.4 {
            QualityBand::Weak
        } else {
            QualityBand::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityBand::Good => "good",
            QualityBand::Fair => "fair",
            QualityBand::Weak => "weak",
            QualityBand::Poor => "poor",
        }
    }
}

impl std::fmt::Display for QualityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Round to three decimal places, the precision every reported score uses.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_band_thresholds() {
        assert_eq!(QualityBand::from_score(0.95), QualityBand::Good);
        assert_eq!(QualityBand::from_score(0.8), QualityBand::Good);
        assert_eq!(QualityBand::from_score(0.79), QualityBand::Fair);
        assert_eq!(QualityBand::from_score(0.6), QualityBand::Fair);
        assert_eq!(QualityBand::from_score(0.4), QualityBand::Weak);
        assert_eq!(QualityBand::from_score(0.39), QualityBand::Poor);
        assert_eq!(QualityBand::from_score(0.0).to_string(), "poor");
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.123456), 0.123);
        assert_eq!(round3(2.0 / 3.0), 0.667);
        assert_eq!(round3(1.0), 1.0);
    }

    #[test]
    fn test_question_evaluation_json_field_names() {
        let eval = QuestionEvaluation {
            question: "q".to_string(),
            retrieved_items: vec![RetrievedItem::new("t", 0.5)],
            generated_answer: "a".to_string(),
            metrics: Metrics {
                context_relevancy: 0.1,
                answer_completeness: 0.2,
                faithfulness: 0.3,
                precision_at_3: 0.4,
                completeness_breakdown: String::new(),
                faithfulness_breakdown: String::new(),
                precision_details: vec![],
            },
            overall_score: 0.25,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&eval).unwrap();
        assert_eq!(json["metrics"]["precision_at_3"], 0.4);
        assert_eq!(json["retrieved_items"][0]["text"], "t");
        assert!(json["timestamp"].is_string());
    }
}

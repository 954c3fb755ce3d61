//! Runs every scorer for one question and folds them into an overall score.

use crate::config::EvalConfig;
use crate::error::Result;
use crate::eval::types::{round3, Metrics, QuestionEvaluation, RetrievedItem};
use crate::eval::{answer_completeness, context_relevancy, faithfulness, precision_at_k};
use crate::judge::JudgeInvoker;
use chrono::Utc;

/// Weighted overall score, rounded to three decimals.
///
/// Pure in its inputs: the same four scores and weights always give the same result.
pub fn overall_score(
    config: &EvalConfig,
    context_relevancy: f64,
    answer_completeness: f64,
    faithfulness: f64,
    precision_at_3: f64,
) -> f64 {
    round3(
        config.relevancy_weight * context_relevancy
            + config.completeness_weight * answer_completeness
            + config.faithfulness_weight * faithfulness
            + config.precision_weight * precision_at_3,
    )
}

/// Metrics aggregator
///
/// Owns the judge invoker and the scoring policy. All four scorers run
/// concurrently; if any of them fails the whole evaluation fails and the
/// remaining judge calls are dropped, so no partial record is ever produced.
#[derive(Clone)]
pub struct MetricsAggregator {
    judge: JudgeInvoker,
    config: EvalConfig,
}

impl MetricsAggregator {
    pub fn new(judge: JudgeInvoker, config: EvalConfig) -> Self {
        Self { judge, config }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn judge(&self) -> &JudgeInvoker {
        &self.judge
    }

    /// Evaluate one question.
    ///
    /// # Arguments
    ///
    /// * `question` - The user's question
    /// * `items` - Retrieved snippets, in similarity order
    /// * `judged_text` - Text graded for faithfulness (usually the generated answer)
    pub async fn aggregate(
        &self,
        question: &str,
        items: &[RetrievedItem],
        judged_text: &str,
    ) -> Result<QuestionEvaluation> {
        let start = std::time::Instant::now();

        let (relevancy, completeness, faithful, precision) = tokio::try_join!(
            context_relevancy(&self.judge, question, items),
            answer_completeness(&self.judge, question, items),
            faithfulness(&self.judge, judged_text, items),
            precision_at_k(&self.judge, question, items, self.config.default_top_k),
        )?;

        let overall = overall_score(
            &self.config,
            relevancy,
            completeness.score,
            faithful.score,
            precision.precision_score,
        );

        log::debug!(
            "Evaluated question in {:?}: overall {:.3} (relevancy {:.3}, completeness {:.3}, faithfulness {:.3}, precision {:.3})",
            start.elapsed(),
            overall,
            relevancy,
            completeness.score,
            faithful.score,
            precision.precision_score
        );

        Ok(QuestionEvaluation {
            question: question.to_string(),
            retrieved_items: items.to_vec(),
            generated_answer: judged_text.to_string(),
            metrics: Metrics {
                context_relevancy: relevancy,
                answer_completeness: completeness.score,
                faithfulness: faithful.score,
                precision_at_3: precision.precision_score,
                completeness_breakdown: completeness.breakdown,
                faithfulness_breakdown: faithful.breakdown,
                precision_details: precision.details,
            },
            overall_score: overall,
            timestamp: Utc::now(),
        })
    }
}

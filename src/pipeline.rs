//! End-to-end question flow: retrieve, answer, evaluate. Also batch runs.

use crate::error::Result;
use crate::eval::{MetricsAggregator, QuestionEvaluation, RetrievedItem};
use crate::generate::AnswerGenerator;
use crate::retrieval::Retriever;
use crate::verdict::{assess_coverage, KbVerdict};
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

/// Which text the faithfulness scorer grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GradedText {
    /// The generated answer.
    #[default]
    Answer,
    /// The KB coverage verdict.
    Verdict,
}

/// Everything produced for one question.
#[derive(Debug, Clone)]
pub struct QuestionOutcome {
    /// Generated answer; `None` when the verdict was graded instead.
    pub answer: Option<String>,
    pub verdict: Option<KbVerdict>,
    pub evaluation: QuestionEvaluation,
}

/// A question the batch could not evaluate.
#[derive(Debug, Clone)]
pub struct FailedQuestion {
    pub question: String,
    pub error: String,
    pub judge_unavailable: bool,
}

/// Successful evaluations in input order plus the questions that were skipped.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub evaluations: Vec<QuestionEvaluation>,
    pub failures: Vec<FailedQuestion>,
}

pub struct Pipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    aggregator: MetricsAggregator,
    top_k: usize,
    graded: GradedText,
}

impl Pipeline {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn AnswerGenerator>,
        aggregator: MetricsAggregator,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            generator,
            aggregator,
            top_k,
            graded: GradedText::default(),
        }
    }

    pub fn grading(mut self, graded: GradedText) -> Self {
        self.graded = graded;
        self
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedItem>> {
        self.retriever.search(question, self.top_k).await
    }

    /// Retrieve and ask the judge whether the snippets cover the question.
    pub async fn check_coverage(&self, question: &str) -> Result<(Vec<RetrievedItem>, KbVerdict)> {
        let items = self.retrieve(question).await?;
        let verdict = assess_coverage(self.aggregator.judge(), question, &items).await?;
        Ok((items, verdict))
    }

    /// Retrieve, produce the graded text, then evaluate.
    ///
    /// Grading the answer generates one; grading the verdict asks for coverage only and
    /// makes no generation call. The evaluation record stores the graded text.
    pub async fn run_question(&self, question: &str) -> Result<QuestionOutcome> {
        let items = self.retrieve(question).await?;
        log::debug!("Retrieved {} snippets for: {}", items.len(), question);

        let (answer, verdict, graded_text) = match self.graded {
            GradedText::Answer => {
                let answer = self.generator.generate(question, &items).await?;
                (Some(answer.clone()), None, answer)
            }
            GradedText::Verdict => {
                let verdict = assess_coverage(self.aggregator.judge(), question, &items).await?;
                let raw = verdict.raw.clone();
                (None, Some(verdict), raw)
            }
        };

        let evaluation = self.aggregator.aggregate(question, &items, &graded_text).await?;

        Ok(QuestionOutcome {
            answer,
            verdict,
            evaluation,
        })
    }

    /// Evaluate many questions, up to `parallelism` at a time.
    ///
    /// A failing question is logged and recorded, never fatal to the batch.
    /// Evaluations come back in input order.
    pub async fn run_batch(&self, questions: &[String], parallelism: usize) -> BatchOutcome {
        let results: Vec<(&String, Result<QuestionOutcome>)> = stream::iter(questions)
            .map(|q| async move { (q, self.run_question(q).await) })
            .buffered(parallelism.max(1))
            .collect()
            .await;

        let mut outcome = BatchOutcome::default();
        for (question, result) in results {
            match result {
                Ok(done) => {
                    log::info!(
                        "Evaluated \"{}\": overall {:.3}",
                        question,
                        done.evaluation.overall_score
                    );
                    outcome.evaluations.push(done.evaluation);
                }
                Err(e) => {
                    log::warn!("Skipping \"{}\": {}", question, e);
                    outcome.failures.push(FailedQuestion {
                        question: question.clone(),
                        error: e.to_string(),
                        judge_unavailable: e.is_judge_unavailable(),
                    });
                }
            }
        }
        outcome
    }
}

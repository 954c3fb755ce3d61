//! Session rollup over many question evaluations, and the JSON artifacts of a batch run.

use crate::error::{KbEvalError, Result};
use crate::eval::types::QuestionEvaluation;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of lowest-scoring questions surfaced in a summary.
pub const WORST_QUESTION_COUNT: usize = 3;

/// Arithmetic mean of each metric across a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub context_relevancy: f64,
    pub answer_completeness: f64,
    pub faithfulness: f64,
    pub precision_at_3: f64,
    pub overall_score: f64,
}

/// A "needs improvement" entry in the summary, with the metric scores that explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstQuestion {
    pub question: String,
    pub overall_score: f64,
    pub context_relevancy: f64,
    pub answer_completeness: f64,
    pub faithfulness: f64,
    pub precision_at_3: f64,
}

/// Statistics derived from a full set of evaluations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_questions: usize,
    /// Timestamp of the first evaluation in input order.
    pub session_start: DateTime<Utc>,
    pub avg_metrics: AverageMetrics,
    /// Ascending by overall score; ties keep input order.
    pub worst_questions: Vec<WorstQuestion>,
}

/// Summarize a batch of evaluations.
///
/// Fails with [`KbEvalError::EmptyBatch`] when there is nothing to average.
pub fn summarize(evaluations: &[QuestionEvaluation]) -> Result<SessionSummary> {
    let first = evaluations.first().ok_or(KbEvalError::EmptyBatch)?;
    let n = evaluations.len() as f64;
    let mean = |f: fn(&QuestionEvaluation) -> f64| evaluations.iter().map(f).sum::<f64>() / n;

    let avg_metrics = AverageMetrics {
        context_relevancy: mean(|e| e.metrics.context_relevancy),
        answer_completeness: mean(|e| e.metrics.answer_completeness),
        faithfulness: mean(|e| e.metrics.faithfulness),
        precision_at_3: mean(|e| e.metrics.precision_at_3),
        overall_score: mean(|e| e.overall_score),
    };

    // sort_by is stable, so equal scores stay in input order
    let mut ranked: Vec<&QuestionEvaluation> = evaluations.iter().collect();
    ranked.sort_by(|a, b| a.overall_score.total_cmp(&b.overall_score));
    let worst_questions = ranked
        .into_iter()
        .take(WORST_QUESTION_COUNT)
        .map(|e| WorstQuestion {
            question: e.question.clone(),
            overall_score: e.overall_score,
            context_relevancy: e.metrics.context_relevancy,
            answer_completeness: e.metrics.answer_completeness,
            faithfulness: e.metrics.faithfulness,
            precision_at_3: e.metrics.precision_at_3,
        })
        .collect();

    Ok(SessionSummary {
        total_questions: evaluations.len(),
        session_start: first.timestamp,
        avg_metrics,
        worst_questions,
    })
}

/// Paths of the two JSON documents written for a run.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub details_path: PathBuf,
    pub summary_path: PathBuf,
}

/// Write `evaluation_details_<stamp>.json` and `evaluation_summary_<stamp>.json` into `dir`.
///
/// `dir` is created if missing.
pub fn write_run_artifacts(
    dir: &Path,
    evaluations: &[QuestionEvaluation],
    summary: &SessionSummary,
    run_at: DateTime<Local>,
) -> Result<RunArtifacts> {
    std::fs::create_dir_all(dir)?;
    let stamp = run_at.format("%Y%m%d_%H%M%S");

    let details_path = dir.join(format!("evaluation_details_{}.json", stamp));
    let summary_path = dir.join(format!("evaluation_summary_{}.json", stamp));

    std::fs::write(&details_path, serde_json::to_string_pretty(evaluations)?)?;
    std::fs::write(&summary_path, serde_json::to_string_pretty(summary)?)?;

    log::info!(
        "Wrote run artifacts: {} and {}",
        details_path.display(),
        summary_path.display()
    );

    Ok(RunArtifacts {
        details_path,
        summary_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::types::{Metrics, RetrievedItem};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn make_eval(question: &str, metrics: [f64; 4], overall: f64) -> QuestionEvaluation {
        QuestionEvaluation {
            question: question.to_string(),
            retrieved_items: vec![RetrievedItem::new("snippet", 0.8)],
            generated_answer: "answer".to_string(),
            metrics: Metrics {
                context_relevancy: metrics[0],
                answer_completeness: metrics[1],
                faithfulness: metrics[2],
                precision_at_3: metrics[3],
                completeness_breakdown: String::new(),
                faithfulness_breakdown: String::new(),
                precision_details: vec![],
            },
            overall_score: overall,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_summarize_empty_batch() {
        assert!(matches!(summarize(&[]), Err(KbEvalError::EmptyBatch)));
    }

    #[test]
    fn test_summarize_averages() {
        let evals = vec![
            make_eval("a", [0.2, 0.4, 0.8, 1.0], 0.55),
            make_eval("b", [0.4, 0.6, 1.0, 0.333], 0.6),
        ];
        let summary = summarize(&evals).unwrap();
        assert_eq!(summary.total_questions, 2);
        let avg = &summary.avg_metrics;
        assert!((avg.context_relevancy - 0.3).abs() < 1e-9);
        assert!((avg.answer_completeness - 0.5).abs() < 1e-9);
        assert!((avg.faithfulness - 0.9).abs() < 1e-9);
        assert!((avg.precision_at_3 - 0.6665).abs() < 1e-9);
        assert!((avg.overall_score - 0.575).abs() < 1e-9);
        assert_eq!(summary.session_start, evals[0].timestamp);
    }

    #[test]
    fn test_worst_questions_ascending_and_stable() {
        let evals = vec![
            make_eval("q1", [0.0; 4], 0.7),
            make_eval("q2", [0.0; 4], 0.4),
            make_eval("q3", [0.0; 4], 0.9),
            make_eval("q4", [0.0; 4], 0.4),
            make_eval("q5", [0.0; 4], 0.2),
        ];
        let summary = summarize(&evals).unwrap();
        let names: Vec<&str> = summary
            .worst_questions
            .iter()
            .map(|w| w.question.as_str())
            .collect();
        assert_eq!(names, vec!["q5", "q2", "q4"]);
    }

    #[test]
    fn test_worst_questions_carry_metric_scores() {
        let evals = vec![
            make_eval("good", [0.9, 0.9, 0.9, 1.0], 0.92),
            make_eval("thin kb", [0.1, 0.2, 0.8, 0.333], 0.32),
        ];
        let summary = summarize(&evals).unwrap();
        let worst = &summary.worst_questions[0];
        assert_eq!(worst.question, "thin kb");
        assert_eq!(worst.context_relevancy, 0.1);
        assert_eq!(worst.answer_completeness, 0.2);
        assert_eq!(worst.faithfulness, 0.8);
        assert_eq!(worst.precision_at_3, 0.333);
    }

    #[test]
    fn test_worst_questions_length_is_min_three_n() {
        for n in 1..=5 {
            let evals: Vec<_> = (0..n)
                .map(|i| make_eval(&format!("q{}", i), [0.5; 4], 0.1 * i as f64))
                .collect();
            let summary = summarize(&evals).unwrap();
            assert_eq!(summary.worst_questions.len(), n.min(3));
        }
    }

    #[test]
    fn test_write_run_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("runs");
        let evals = vec![make_eval("Why is my SCOM agent not sending heartbeats?", [0.5, 0.8, 0.9, 1.0], 0.785)];
        let summary = summarize(&evals).unwrap();
        let run_at = Local.with_ymd_and_hms(2026, 10, 18, 9, 30, 5).unwrap();

        let artifacts = write_run_artifacts(&out, &evals, &summary, run_at).unwrap();
        assert!(artifacts
            .details_path
            .ends_with("evaluation_details_20261018_093005.json"));
        assert!(artifacts
            .summary_path
            .ends_with("evaluation_summary_20261018_093005.json"));

        let details: Vec<QuestionEvaluation> =
            serde_json::from_str(&std::fs::read_to_string(&artifacts.details_path).unwrap()).unwrap();
        assert_eq!(details, evals);
        let written: SessionSummary =
            serde_json::from_str(&std::fs::read_to_string(&artifacts.summary_path).unwrap()).unwrap();
        assert_eq!(written.total_questions, 1);
        assert_eq!(written.worst_questions[0].overall_score, 0.785);
    }
}

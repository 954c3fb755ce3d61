//! Quality evaluation: LLM-judged relevancy, completeness, faithfulness, precision@k,
//! the weighted aggregate, and session summaries.

pub mod aggregate;
pub mod completeness;
pub mod faithfulness;
pub mod parse;
pub mod precision;
pub mod relevancy;
pub mod report;
pub mod types;

pub use aggregate::{overall_score, MetricsAggregator};
pub use completeness::answer_completeness;
pub use faithfulness::faithfulness;
pub use precision::precision_at_k;
pub use relevancy::context_relevancy;
pub use report::{summarize, write_run_artifacts, RunArtifacts, SessionSummary};
pub use types::{
    JudgedScore, Metrics, PrecisionDetail, PrecisionResult, QualityBand, QuestionEvaluation,
    RetrievedItem,
};

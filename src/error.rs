use thiserror::Error;

/// Main error type for kbeval
#[derive(Error, Debug)]
pub enum KbEvalError {
    /// The judge model call failed or timed out
    #[error("Judge unavailable: {0}")]
    JudgeUnavailable(String),

    /// Summary requested over zero evaluations
    #[error("Cannot summarize an empty batch of evaluations")]
    EmptyBatch,

    /// Vector search errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Embedding API errors
    #[error("Embedding API error: {0}")]
    Embedding(String),

    /// Answer generation errors
    #[error("Generation error: {0}")]
    Generation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KbEvalError {
    /// True when the failure came from the judge transport rather than the pipeline itself.
    pub fn is_judge_unavailable(&self) -> bool {
        matches!(self, KbEvalError::JudgeUnavailable(_))
    }
}

/// Convenient Result type using KbEvalError
pub type Result<T> = std::result::Result<T, KbEvalError>;

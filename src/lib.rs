pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod eval;
pub mod generate;
pub mod judge;
pub mod pipeline;
pub mod retrieval;
pub mod verdict;

pub use config::{Config, EvalConfig};
pub use error::{KbEvalError, Result};
pub use eval::{summarize, MetricsAggregator, QuestionEvaluation, RetrievedItem, SessionSummary};
pub use judge::{Judge, JudgeInvoker};
pub use pipeline::Pipeline;

use std::sync::Arc;
use std::time::Duration;

/// Wire the production collaborators (Ollama, OpenAI-compatible embeddings, Qdrant) from config.
pub fn build_pipeline(config: &Config) -> Pipeline {
    let timeout = Duration::from_secs(config.judge.timeout_secs);

    let judge_model: Arc<dyn Judge> = Arc::new(judge::OllamaChat::new(
        config.judge.host.clone(),
        config.evaluation.judge_model.clone(),
        timeout,
    ));
    let invoker = JudgeInvoker::new(judge_model, timeout, config.judge.max_concurrency);

    // answers can take longer than a one-line verdict
    let generator_model: Arc<dyn Judge> = Arc::new(judge::OllamaChat::new(
        config.judge.host.clone(),
        config.generation_model(),
        timeout * 4,
    ));
    let generator = generate::LlmAnswerGenerator::new(generator_model);

    let mut embedder = embeddings::Embedder::new(
        config.embeddings.base_url.clone(),
        config.embeddings.model.clone(),
        config.embeddings_api_key(),
    );
    if config.embeddings.cache_capacity > 0 {
        embedder = embedder.with_cache(Arc::new(cache::QueryEmbeddingCache::new(
            config.embeddings.cache_capacity,
        )));
    }
    let retriever = retrieval::QdrantRetriever::new(
        config.retrieval.qdrant_url.clone(),
        config.retrieval.collection.clone(),
        embedder,
    );

    Pipeline::new(
        Arc::new(retriever),
        Arc::new(generator),
        MetricsAggregator::new(invoker, config.evaluation.clone()),
        config.retrieval.top_k,
    )
}

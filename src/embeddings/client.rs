use crate::cache::QueryEmbeddingCache;
use crate::error::{KbEvalError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Request body for an OpenAI-compatible embeddings endpoint
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Response body from the embeddings endpoint
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Query embedder
///
/// Talks to any OpenAI-compatible `/embeddings` endpoint (Ollama, a local
/// text-embeddings server, or OpenAI itself). Retries rate limits and server
/// errors with exponential backoff and optionally caches query vectors.
pub struct Embedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    cache: Option<Arc<QueryEmbeddingCache>>,
}

impl Embedder {
    /// Create a new embedder
    ///
    /// # Arguments
    ///
    /// * `base_url` - Endpoint root, e.g. "http://localhost:11434/v1"
    /// * `model` - Embedding model name
    /// * `api_key` - Bearer token, when the endpoint needs one
    ///
    /// # Panics
    ///
    /// Panics if HTTP client cannot be created (should not happen in normal operation)
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            cache: None,
        }
    }

    /// Attach a query cache
    pub fn with_cache(mut self, cache: Arc<QueryEmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Embed one query, consulting the cache first and retrying transient API errors.
    pub async fn embed_query(&self, text: &str, max_retries: usize) -> Result<Vec<f32>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(text) {
                log::debug!("Cache hit for query: {}", text);
                return Ok(cached);
            }
        }

        let embedding = self.embed_with_retry(text, max_retries).await?;

        if let Some(cache) = &self.cache {
            cache.put(text.to_string(), embedding.clone());
        }

        Ok(embedding)
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: vec![text],
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| KbEvalError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(KbEvalError::Embedding(format!(
                "Embeddings API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| KbEvalError::Embedding(format!("Failed to parse response: {}", e)))?;

        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| KbEvalError::Embedding("Empty response from embeddings API".to_string()))
    }

    async fn embed_with_retry(&self, text: &str, max_retries: usize) -> Result<Vec<f32>> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.request(text).await {
                Ok(embedding) => {
                    log::debug!(
                        "Embedding API call took {:?} (attempt {})",
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(embedding);
                }
                Err(e) if attempt < max_retries && is_retryable(&e) => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Rate limits (429) and 5xx responses are worth retrying; anything else is not.
fn is_retryable(err: &KbEvalError) -> bool {
    let msg = err.to_string();
    ["429", "500", "502", "503", "504"]
        .iter()
        .any(|code| msg.contains(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_new_trims_base_url() {
        let embedder = Embedder::new("http://localhost:11434/v1/", "bge-small-en-v1.5", None);
        assert_eq!(embedder.base_url, "http://localhost:11434/v1");
        assert_eq!(embedder.model, "bge-small-en-v1.5");
        assert!(embedder.cache.is_none());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&KbEvalError::Embedding(
            "Embeddings API error 429 Too Many Requests: slow down".to_string()
        )));
        assert!(is_retryable(&KbEvalError::Embedding(
            "Embeddings API error 503 Service Unavailable: ".to_string()
        )));
        assert!(!is_retryable(&KbEvalError::Embedding(
            "Embeddings API error 401 Unauthorized: bad key".to_string()
        )));
    }

    #[tokio::test]
    async fn test_cached_query_skips_api() {
        let cache = Arc::new(QueryEmbeddingCache::new(8));
        cache.put("heartbeats".to_string(), vec![0.5; 4]);
        // unreachable endpoint: only the cache can answer
        let embedder = Embedder::new("http://127.0.0.1:9", "m", None).with_cache(cache);
        assert_eq!(embedder.embed_query("heartbeats", 0).await.unwrap(), vec![0.5; 4]);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails_without_retry() {
        let embedder = Embedder::new("http://127.0.0.1:9", "m", None);
        let err = embedder.embed_query("heartbeats", 0).await.unwrap_err();
        assert!(matches!(err, KbEvalError::Embedding(_)));
    }
}

//! Vector retrieval against the knowledge base collection in Qdrant.

use crate::embeddings::Embedder;
use crate::error::{KbEvalError, Result};
use crate::eval::RetrievedItem;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-k semantic search over the knowledge base.
///
/// Implementations return items ordered by descending similarity.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedItem>>;
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Deserialize)]
struct QueryResult {
    points: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<SnippetPayload>,
}

#[derive(Deserialize)]
struct SnippetPayload {
    #[serde(default)]
    text: Option<String>,
}

/// Qdrant REST retriever
///
/// Embeds the query, then calls `POST /collections/{collection}/points/query`.
/// Points without a `text` payload are skipped.
pub struct QdrantRetriever {
    client: Client,
    url: String,
    collection: String,
    embedder: Embedder,
}

impl QdrantRetriever {
    /// # Panics
    ///
    /// Panics if HTTP client cannot be created (should not happen in normal operation)
    pub fn new(url: impl Into<String>, collection: impl Into<String>, embedder: Embedder) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
            embedder,
        }
    }

    fn query_url(&self) -> String {
        format!("{}/collections/{}/points/query", self.url, self.collection)
    }
}

fn into_items(response: QueryResponse) -> Vec<RetrievedItem> {
    response
        .result
        .points
        .into_iter()
        .filter_map(|point| {
            let text = point.payload?.text?;
            Some(RetrievedItem::new(text, point.score))
        })
        .collect()
}

#[async_trait]
impl Retriever for QdrantRetriever {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedItem>> {
        if query.trim().is_empty() {
            return Err(KbEvalError::InvalidInput("Query cannot be empty".to_string()));
        }

        let start = std::time::Instant::now();
        let vector = self.embedder.embed_query(query, 3).await?;
        log::debug!("Vector search: query embedding took {:?}", start.elapsed());

        let request = QueryRequest {
            query: &vector,
            limit: top_k,
            with_payload: true,
        };

        let response = self
            .client
            .post(self.query_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| KbEvalError::Retrieval(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(KbEvalError::Retrieval(format!(
                "Qdrant error {}: {}",
                status, body
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| KbEvalError::Retrieval(format!("Failed to parse response: {}", e)))?;

        let items = into_items(parsed);
        log::debug!(
            "Vector search returned {} items in {:?}",
            items.len(),
            start.elapsed()
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url() {
        let retriever = QdrantRetriever::new(
            "http://localhost:6333/",
            "infra_kb",
            Embedder::new("http://localhost:11434/v1", "m", None),
        );
        assert_eq!(
            retriever.query_url(),
            "http://localhost:6333/collections/infra_kb/points/query"
        );
    }

    #[test]
    fn test_request_serialization() {
        let vector = [0.1_f32, 0.2];
        let request = QueryRequest {
            query: &vector,
            limit: 3,
            with_payload: true,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["limit"], 3);
        assert_eq!(json["with_payload"], true);
        assert_eq!(json["query"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_response_keeps_order_and_skips_textless_points() {
        let body = r#"{
            "result": {"points": [
                {"id": 7, "version": 1, "score": 0.91, "payload": {"text": "Restart the Health Service."}},
                {"id": 3, "version": 1, "score": 0.74, "payload": {"source": "no text here"}},
                {"id": 9, "version": 1, "score": 0.52, "payload": {"text": "Open port 5723."}}
            ]},
            "status": "ok",
            "time": 0.001
        }"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let items = into_items(parsed);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "Restart the Health Service.");
        assert_eq!(items[0].score, 0.91);
        assert_eq!(items[1].score, 0.52);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let retriever = QdrantRetriever::new(
            "http://localhost:6333",
            "infra_kb",
            Embedder::new("http://localhost:11434/v1", "m", None),
        );
        let err = retriever.search("   ", 3).await.unwrap_err();
        assert!(matches!(err, KbEvalError::InvalidInput(_)));
    }
}

use super::Judge;
use crate::error::{KbEvalError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for Ollama's chat endpoint
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Non-streaming chat response
#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Ollama chat client
///
/// Sends a single user message per call to `POST {host}/api/chat` and returns
/// the assistant's reply text. The HTTP timeout is a backstop; callers normally
/// bound calls through [`super::JudgeInvoker`].
pub struct OllamaChat {
    client: Client,
    host: String,
    model: String,
}

impl OllamaChat {
    /// Create a new chat client
    ///
    /// # Arguments
    ///
    /// * `host` - Ollama base URL (e.g., "http://localhost:11434")
    /// * `model` - Model name (e.g., "llama3.2")
    /// * `timeout` - HTTP request timeout
    ///
    /// # Panics
    ///
    /// Panics if HTTP client cannot be created (should not happen in normal operation)
    pub fn new(host: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Judge for OllamaChat {
    async fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.host))
            .json(&request)
            .send()
            .await
            .map_err(|e| KbEvalError::JudgeUnavailable(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(KbEvalError::JudgeUnavailable(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            KbEvalError::JudgeUnavailable(format!("Failed to parse response: {}", e))
        })?;

        Ok(result.message.content)
    }
}

//! Judge invocation: the transport every metric uses to ask a language model for a verdict.

pub mod ollama;

#[cfg(test)]
pub(crate) mod testing;

pub use ollama::OllamaChat;

use crate::error::{KbEvalError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// A chat-capable language model: one prompt in, one reply out.
///
/// Used both as the evaluation judge and as the answer generator; the two are
/// distinguished only by prompt content.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn chat(&self, prompt: &str) -> Result<String>;
}

/// Wraps a [`Judge`] with a per-call timeout and a shared concurrency limit.
///
/// Cloning is cheap and clones share the same limit, so one invoker can be
/// handed to every scorer in a run.
#[derive(Clone)]
pub struct JudgeInvoker {
    judge: Arc<dyn Judge>,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl JudgeInvoker {
    pub fn new(judge: Arc<dyn Judge>, timeout: Duration, max_concurrency: usize) -> Self {
        Self {
            judge,
            timeout,
            permits: Arc::new(Semaphore::new(max_concurrency.max(1))),
        }
    }

    /// Send one prompt to the judge and return its raw reply.
    ///
    /// Any transport error or an elapsed timeout becomes
    /// [`KbEvalError::JudgeUnavailable`]. No retries happen here.
    pub async fn invoke(&self, prompt: &str) -> Result<String> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| KbEvalError::JudgeUnavailable("judge limiter closed".to_string()))?;

        let start = std::time::Instant::now();
        let reply = match tokio::time::timeout(self.timeout, self.judge.chat(prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(KbEvalError::JudgeUnavailable(msg))) => {
                return Err(KbEvalError::JudgeUnavailable(msg))
            }
            Ok(Err(e)) => return Err(KbEvalError::JudgeUnavailable(e.to_string())),
            Err(_) => {
                return Err(KbEvalError::JudgeUnavailable(format!(
                    "no reply within {:?}",
                    self.timeout
                )))
            }
        };
        log::debug!("Judge call took {:?}", start.elapsed());
        Ok(reply)
    }
}

/// Join retrieved snippets into the single context block the judge prompts embed.
pub(crate) fn joined_context(items: &[crate::eval::RetrievedItem]) -> String {
    items
        .iter()
        .map(|item| item.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

//! Deterministic stand-ins for the judge model, used by unit tests.

use super::{Judge, JudgeInvoker};
use crate::error::{KbEvalError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Replies with whatever the script returns for the prompt.
pub(crate) struct ScriptedJudge {
    script: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl ScriptedJudge {
    pub(crate) fn new(script: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
        }
    }

    /// Invoker over a scripted judge with a generous timeout.
    pub(crate) fn invoker(script: impl Fn(&str) -> String + Send + Sync + 'static) -> JudgeInvoker {
        JudgeInvoker::new(Arc::new(Self::new(script)), Duration::from_secs(5), 4)
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn chat(&self, prompt: &str) -> Result<String> {
        Ok((self.script)(prompt))
    }
}

/// Always fails, as an unreachable Ollama would.
pub(crate) struct FailingJudge;

#[async_trait]
impl Judge for FailingJudge {
    async fn chat(&self, _prompt: &str) -> Result<String> {
        Err(KbEvalError::JudgeUnavailable("connection refused".to_string()))
    }
}

/// Answers only after `delay`.
pub(crate) struct SlowJudge {
    pub(crate) delay: Duration,
}

#[async_trait]
impl Judge for SlowJudge {
    async fn chat(&self, _prompt: &str) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok("late".to_string())
    }
}

// In crates/api-client/src/llm.rs

use crate::types::{ChatMessage, ChatRequest, ChatResponse, LlmSettings};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A text-completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one system + user message pair and returns the raw reply text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// The provider name, for logging.
    fn provider(&self) -> &str;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    settings: LlmSettings,
}

impl OpenAiClient {
    pub fn new(settings: LlmSettings, api_key: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;
        Ok(Self { http_client, api_key: api_key.into(), settings })
    }

    /// Builds a client from the key named in `settings.api_key_env`.
    ///
    /// Returns `Ok(None)` when the variable is unset or empty.
    pub fn from_env(settings: LlmSettings) -> Result<Option<Self>> {
        match std::env::var(&settings.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Self::new(settings, key.trim()).map(Some),
            _ => {
                tracing::warn!(
                    var = %settings.api_key_env,
                    "API key not found; model-driven signals are disabled."
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;

        if !status.is_success() {
            // Error bodies look like {"error": {"message": "...", "code": "..."}}.
            let msg = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            return Err(Error::ApiError { code: status.as_u16().to_string(), msg });
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(Error::DeserializationFailed)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::ApiError { code: status.as_u16().to_string(), msg: "empty completion".into() })
    }

    fn provider(&self) -> &str {
        "openai"
    }
}

/// A completion client that replays canned replies in order.
///
/// Once the script is exhausted the last reply is repeated. Also records every prompt it
/// receives, which makes it useful for dry runs and tests.
#[derive(Debug, Default)]
pub struct ScriptedCompletionClient {
    replies: Mutex<VecDeque<Result<String>>>,
    last: Mutex<Option<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletionClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            ..Default::default()
        }
    }

    /// Queues a transport failure as the next reply.
    pub fn push_failure(&self, msg: &str) {
        if let Ok(mut q) = self.replies.lock() {
            q.push_back(Err(Error::ApiError { code: "503".into(), msg: msg.into() }));
        }
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(reply)) => {
                if let Ok(mut last) = self.last.lock() {
                    *last = Some(reply.clone());
                }
                Ok(reply)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .ok()
                .and_then(|l| l.clone())
                .ok_or_else(|| Error::ApiError { code: "404".into(), msg: "script exhausted".into() }),
        }
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}

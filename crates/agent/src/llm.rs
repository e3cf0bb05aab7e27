use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use parley_core::ModelRef;

/// A text generator behind an opaque model label. Implementations own their
/// transport, timeouts, and retry budget; callers treat every completion as
/// fallible and keep a deterministic fallback ready.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, model: &ModelRef, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completions endpoint (OpenRouter in
/// production). A failed or empty primary completion gets exactly one retry
/// against the configured fallback model; anything after that is the
/// caller's fallback problem.
pub struct OpenRouterClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    fallback_model: ModelRef,
    temperature: f64,
}

impl OpenRouterClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        fallback_model: ModelRef,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            fallback_model,
            temperature: 0.8,
        })
    }

    async fn request(&self, model: &ModelRef, prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("no LLM api key configured");
        };

        let body = ChatRequest {
            model: &model.0,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: self.temperature,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("completion request to `{model}` failed"))?
            .error_for_status()
            .with_context(|| format!("completion request to `{model}` was rejected"))?;

        let parsed: ChatResponse =
            response.json().await.context("completion response was not valid JSON")?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            bail!("model `{model}` returned empty content");
        }

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(&self, model: &ModelRef, prompt: &str) -> Result<String> {
        match self.request(model, prompt).await {
            Ok(content) => Ok(content),
            Err(primary_error) => {
                tracing::warn!(
                    event_name = "llm.primary_model_failed",
                    model = %model,
                    fallback = %self.fallback_model,
                    error = %primary_error,
                    "primary completion failed, trying fallback model once"
                );
                self.request(&self.fallback_model, prompt).await
            }
        }
    }
}

/// Test double that always answers with the same canned text.
pub struct StaticClient {
    reply: String,
}

impl StaticClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into() }
    }
}

#[async_trait]
impl LlmClient for StaticClient {
    async fn complete(&self, _model: &ModelRef, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }
}

/// Test double that fails every completion, exercising fallback paths.
#[derive(Default)]
pub struct FailingClient;

#[async_trait]
impl LlmClient for FailingClient {
    async fn complete(&self, model: &ModelRef, _prompt: &str) -> Result<String> {
        bail!("model `{model}` is unavailable")
    }
}

#[cfg(test)]
mod tests {
    use parley_core::ModelRef;

    use super::{FailingClient, LlmClient, OpenRouterClient, StaticClient};

    #[tokio::test]
    async fn static_client_echoes_its_reply() {
        let client = StaticClient::new("canned");
        let reply = client.complete(&ModelRef("any".to_owned()), "prompt").await.expect("reply");
        assert_eq!(reply, "canned");
    }

    #[tokio::test]
    async fn failing_client_always_errors() {
        let client = FailingClient;
        assert!(client.complete(&ModelRef("any".to_owned()), "prompt").await.is_err());
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_touching_the_network() {
        let client = OpenRouterClient::new(
            "https://example.invalid/api/v1",
            None,
            ModelRef("fallback".to_owned()),
            std::time::Duration::from_secs(1),
        )
        .expect("client builds");

        let error = client
            .complete(&ModelRef("primary".to_owned()), "prompt")
            .await
            .expect_err("no key configured");
        assert!(error.to_string().contains("no LLM api key"));
    }
}

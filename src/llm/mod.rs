use crate::config::{CompletionProfile, LlmConfig};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for an OpenAI-compatible chat completion API
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    /// Create a new chat client
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self {
            client: builder.build().context("Failed to build LLM HTTP client")?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Run one completion and return the raw text of the first choice
    pub async fn complete(
        &self,
        profile: &CompletionProfile,
        system: &str,
        prompt: &str,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &profile.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: profile.temperature,
            max_tokens: profile.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to LLM provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error: {} - {}", status, body);
        }

        let result: ChatResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        let content = result
            .choices
            .into_iter()
            .next()
            .context("LLM response contained no choices")?
            .message
            .content
            .unwrap_or_default();

        tracing::debug!(model = %profile.model, "LLM raw output:\n{}", content);

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_llm_stub, spawn_stub};
    use axum::{http::StatusCode, routing::post, Router};

    fn client_for(base_url: &str) -> ChatClient {
        let config = LlmConfig {
            base_url: format!("{}/", base_url),
            ..Default::default()
        };
        ChatClient::new(&config, "sk-test").unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let (base, recorded) = spawn_llm_stub("hello there").await;

        let text = client_for(&base)
            .complete(&CompletionProfile::evaluation(), "Be brief.", "Say hi")
            .await
            .unwrap();

        assert_eq!(text, "hello there");

        let requests = recorded.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let body = &requests[0];
        assert_eq!(body["model"], "baidu/ernie-4.5-21B-a3b-thinking");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Be brief.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Say hi");
    }

    #[tokio::test]
    async fn test_complete_propagates_provider_errors() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let base = spawn_stub(router).await;

        let err = client_for(&base)
            .complete(&CompletionProfile::analysis(), "s", "p")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn test_complete_unreachable_provider() {
        let client = client_for("http://127.0.0.1:9");
        let result = client
            .complete(&CompletionProfile::analysis(), "s", "p")
            .await;
        assert!(result.is_err());
    }
}

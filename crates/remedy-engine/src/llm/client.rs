//! Minimal OpenRouter chat-completions client.

use anyhow::{anyhow, Context, Result};
use remedy_core::util::{debug_stderr_enabled, truncate};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;

/// OpenRouter direct API URL (BYOK mode)
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

const LLM_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Maximum length for error content in error messages
const MAX_ERROR_CONTENT_LEN: usize = 200;

/// Sanitize API response content for error messages to prevent credential leakage.
fn sanitize_api_response(content: &str) -> String {
    const SECRET_PATTERNS: &[&str] = &[
        "api_key",
        "apikey",
        "secret",
        "password",
        "credential",
        "bearer",
        "sk-", // OpenAI/OpenRouter key prefix
    ];

    let truncated = truncate(content, MAX_ERROR_CONTENT_LEN);

    let lower = truncated.to_lowercase();
    for pattern in SECRET_PATTERNS {
        if lower.contains(pattern) {
            return "(response details redacted - may contain sensitive data)".to_string();
        }
    }

    truncated
}

/// API usage information from the LLM provider.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// One system+user completion. Returns the assistant message content.
    pub async fn complete(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        let request = self
            .http
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let response = timeout(LLM_REQUEST_TIMEOUT, request)
            .await
            .map_err(|_| {
                anyhow!(
                    "LLM request timed out after {}s",
                    LLM_REQUEST_TIMEOUT.as_secs()
                )
            })?
            .context("LLM request failed")?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read LLM response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "LLM request failed with status {}: {}",
                status,
                sanitize_api_response(&text)
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            anyhow!(
                "Unexpected LLM response shape ({}): {}",
                e,
                sanitize_api_response(&text)
            )
        })?;

        if debug_stderr_enabled() {
            if let Some(usage) = &parsed.usage {
                eprintln!(
                    "  llm usage: {} prompt + {} completion tokens",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }
        }

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("LLM response contained no message content"))
    }
}

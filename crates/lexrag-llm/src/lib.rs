//! Chat-completion client for Groq's OpenAI-compatible API.
//!
//! The HTTP call is async (reqwest); [`GroqClient`] owns a small tokio
//! runtime and blocks on it so the rest of the pipeline stays synchronous.

use std::time::{Duration, Instant};

use lexrag_core::config::LlmSettings;
use lexrag_core::traits::Generator;
use lexrag_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: u32,
}

impl ChatResponse {
    fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| Error::Generation("response contained no choices".into()))
    }
}

pub struct GroqClient {
    client: Client,
    runtime: Runtime,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GroqClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Generation(format!("failed to build HTTP client: {e}")))?;
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let endpoint = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));
        let api_key = settings.api_key.clone().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("no Groq API key configured (set GROQ_API_KEY); generation will fail");
        }
        info!(endpoint = %endpoint, model = %settings.model, "Groq client configured");
        Ok(Self { client, runtime, endpoint, model: settings.model.clone(), api_key })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage<'_>>, max_tokens: u32, temperature: f32) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Generation("GROQ_API_KEY is not set".into()))?;
        let request = ChatRequest { model: &self.model, messages, max_tokens, temperature };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("API returned {status}: {body}")));
        }
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed response: {e}")))?;
        if let Some(usage) = &parsed.usage {
            debug!(tokens = usage.total_tokens, "completion usage");
        }
        parsed.into_text()
    }

    /// Send a tiny request to check the key and the endpoint.
    pub fn ping(&self) -> bool {
        let messages = vec![ChatMessage { role: "user", content: "ping" }];
        match self.runtime.block_on(self.chat(messages, 5, 0.0)) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Groq API connection check failed");
                false
            }
        }
    }
}

impl Generator for GroqClient {
    fn complete(&self, system_prompt: &str, user_prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage { role: "system", content: system_prompt },
            ChatMessage { role: "user", content: user_prompt },
        ];
        let text = self.runtime.block_on(self.chat(messages, max_tokens, temperature))?;
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, chars = text.len(), "completion received");
        Ok(text)
    }
}

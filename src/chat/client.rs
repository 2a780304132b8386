use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ChatConfig;

pub const SYSTEM_PROMPT: &str =
    "You are a friendly pet care expert. Answer kindly, practically and concisely.";

/// Chat-completion backend: text in, text out.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiChat {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiChat {
    pub fn new(cfg: &ChatConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("build chat http client")?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

#[async_trait]
impl ChatClient for OpenAiChat {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("OPENAI_API_KEY is not configured")?;

        let body = CompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: 0.7,
            max_tokens: 300,
        };

        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!(%status, "chat completion rejected");
            anyhow::bail!("chat completion returned {}: {}", status, text);
        }

        let parsed: CompletionResponse = res.json().await.context("decode chat completion")?;
        let content = first_reply(parsed)?;
        debug!(chars = content.len(), "chat completion received");
        Ok(content)
    }
}

fn first_reply(res: CompletionResponse) -> anyhow::Result<String> {
    res.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .context("chat completion had no content")
}

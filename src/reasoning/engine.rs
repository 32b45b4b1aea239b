//! Reasoning engine interface and the Ollama-backed session.
//!
//! A session owns the HTTP client for one run. It is acquired before the
//! first chunk and released when dropped, so no connection state outlives
//! the run that created it.

use crate::error::ReasoningError;
use crate::reasoning::response::AnalysisContext;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Something that turns a chunk context into raw analysis text.
pub trait ReasoningEngine: Send + Sync {
    fn analyze<'a>(
        &'a self,
        context: &'a AnalysisContext,
    ) -> BoxFuture<'a, Result<String, ReasoningError>>;
}

/// Connection settings for the Ollama chat API.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.1,
            timeout_seconds: 300,
        }
    }
}

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// A per-run handle to an Ollama server.
pub struct OllamaSession {
    config: EngineConfig,
    http_client: reqwest::Client,
    requests: AtomicUsize,
}

impl OllamaSession {
    /// Build the HTTP client for a run.
    pub fn acquire(config: EngineConfig) -> Result<Self, ReasoningError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ReasoningError::Transport(e.to_string()))?;

        info!(
            "Acquired reasoning session: model {} at {}",
            config.model_name, config.ollama_url
        );

        Ok(Self {
            config,
            http_client,
            requests: AtomicUsize::new(0),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    /// Number of requests sent through this session so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    async fn send_prompt(&self, context: &AnalysisContext) -> Result<String, ReasoningError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));
        let context_json = serde_json::to_string_pretty(context)?;

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SECURITY_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(context, &context_json),
                },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!(
            "Sending {} chunk with {} files to {}",
            context.category,
            context.files.len(),
            url
        );

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    ReasoningError::Connect(self.config.ollama_url.clone())
                } else {
                    ReasoningError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Api { status, body });
        }

        // The content is parsed by the caller; only the envelope must be valid here.
        let chat_response: OllamaChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ReasoningError::Timeout(self.config.timeout_seconds)
            } else {
                ReasoningError::Transport(format!("Failed to read Ollama response: {}", e))
            }
        })?;

        Ok(chat_response.message.content)
    }
}

impl ReasoningEngine for OllamaSession {
    fn analyze<'a>(
        &'a self,
        context: &'a AnalysisContext,
    ) -> BoxFuture<'a, Result<String, ReasoningError>> {
        self.send_prompt(context).boxed()
    }
}

impl Drop for OllamaSession {
    fn drop(&mut self) {
        debug!(
            "Released reasoning session after {} requests",
            self.request_count()
        );
    }
}

fn build_user_prompt(context: &AnalysisContext, context_json: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Repository: {}\nAnalysis intent: {}\nChunk category: {}\n\n",
        context.repository, context.intent, context.category
    ));
    prompt.push_str(
        "Assess the security risk of these files based on their paths and classification:\n\n",
    );
    prompt.push_str("```json\n");
    prompt.push_str(context_json);
    prompt.push_str("\n```\n\nRespond with a single JSON object only.");
    prompt
}

/// System prompt describing the response schema.
const SECURITY_SYSTEM_PROMPT: &str = r#"You are a security auditor reviewing a repository's security-relevant files.
You receive one batch of files that share a category (secret, dependency, security, deployment or config).

Respond with exactly one JSON object using this schema:
{
  "summary": "one paragraph",
  "findings": [
    {
      "type": "vulnerability | secret | dependency | configuration | security",
      "severity": "critical | high | medium | low | info",
      "title": "short title",
      "description": "what is wrong and why it matters",
      "file_path": "path/from/the/batch",
      "line_number": 0,
      "recommendation": "how to fix it"
    }
  ],
  "recommendations": ["repository-level advice"],
  "risk_score": 0
}

Only report issues you can justify from the file names and categories given. Do not invent files."#;

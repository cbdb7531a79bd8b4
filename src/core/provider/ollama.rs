use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{classify_send_error, http_client, ModelPrompt, ModelProvider};
use crate::error::ProviderError;
use crate::models::RawModelReply;

/// No tokens for this long aborts the generation
const STALL_TIMEOUT: Duration = Duration::from_secs(120);
const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    url: String,
    model: String,
    timeout_seconds: u64,
    stream_to_stdout: bool,
}

/// Chat message for Ollama chat API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

impl WireMessage {
    fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f64,
    num_predict: u32,
}

/// Request body for Ollama chat endpoint
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    options: ChatOptions,
}

/// One line of the streamed reply
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ChatMessageResponse>,
    done: bool,
    #[serde(default)]
    total_duration: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: String,
}

impl OllamaClient {
    pub fn new(
        url: String,
        model: String,
        timeout_seconds: u64,
        stream_to_stdout: bool,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout_seconds)?,
            url: url.trim_end_matches('/').to_string(),
            model,
            timeout_seconds,
            stream_to_stdout,
        })
    }

    fn chat_request(&self, prompt: &ModelPrompt) -> ChatRequest {
        let mut messages = Vec::new();
        if let Some(sys) = &prompt.system {
            messages.push(WireMessage::system(sys.as_str()));
        }
        messages.push(WireMessage::user(prompt.text.as_str()));

        ChatRequest {
            model: self.model.clone(),
            messages,
            stream: true,
            options: ChatOptions {
                temperature: prompt.temperature,
                num_predict: prompt.max_tokens,
            },
        }
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/api/tags", self.url);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| classify_send_error(e, "Ollama", &self.url, 5))?;

        Ok(response.status().is_success())
    }
}

/// Accumulates newline-delimited JSON chunks into reply text
#[derive(Default)]
struct StreamAccumulator {
    buffer: String,
    text: String,
    chunks: usize,
    done: bool,
}

impl StreamAccumulator {
    /// Feed raw bytes; returns the content pieces decoded from complete lines
    fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, ProviderError> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut pieces = Vec::new();

        while let Some(newline_pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline_pos).collect();
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parsed: ChatResponse = match serde_json::from_str(line) {
                Ok(p) => p,
                Err(e) => {
                    // A mangled trailer after real content is harmless
                    if !self.text.is_empty() {
                        debug!("Ignoring parse error on final chunk: {}", e);
                        continue;
                    }
                    let excerpt: String = line.chars().take(200).collect();
                    return Err(ProviderError::ParseError(format!(
                        "Failed to parse: {} - {}",
                        excerpt, e
                    )));
                }
            };

            let content = parsed.message.map(|m| m.content).unwrap_or_default();
            self.text.push_str(&content);
            self.chunks += 1;
            pieces.push(content);

            if parsed.done {
                self.done = true;
                if let Some(duration) = parsed.total_duration {
                    debug!("Generation completed in {}ms", duration / 1_000_000);
                }
                if let Some(count) = parsed.eval_count {
                    debug!("Tokens generated: {}", count);
                }
                break;
            }
        }
        Ok(pieces)
    }
}

#[async_trait]
impl ModelProvider for OllamaClient {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate(&self, prompt: &ModelPrompt) -> Result<RawModelReply, ProviderError> {
        let url = format!("{}/api/chat", self.url);
        let request = self.chat_request(prompt);

        debug!("Sending chat request to Ollama: {}", url);
        debug!("Using model: {}", self.model);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_send_error(e, "Ollama", &self.url, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::HttpError { status, message });
        }

        let mut stream = response.bytes_stream();
        let mut acc = StreamAccumulator::default();
        let mut last_progress_log = Instant::now();
        let mut last_token_time = Instant::now();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| ProviderError::StreamError(e.to_string()))?;

            if last_token_time.elapsed() > STALL_TIMEOUT {
                warn!("Generation stalled - no tokens received for {:?}", STALL_TIMEOUT);
                return Err(ProviderError::Timeout(STALL_TIMEOUT.as_secs()));
            }

            let pieces = acc.push(&chunk)?;
            if !pieces.is_empty() {
                last_token_time = Instant::now();
            }

            if self.stream_to_stdout {
                for piece in &pieces {
                    print!("{}", piece);
                }
                io::stdout().flush().ok();
            } else if last_progress_log.elapsed() > PROGRESS_INTERVAL {
                info!(
                    "Generation in progress: {} chunks, {} chars so far...",
                    acc.chunks,
                    acc.text.len()
                );
                last_progress_log = Instant::now();
            }

            if acc.done {
                if self.stream_to_stdout {
                    println!();
                }
                break;
            }
        }

        if acc.text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse("Ollama".to_string()));
        }

        info!("Generated {} characters", acc.text.len());
        Ok(RawModelReply::new(acc.text))
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{classify_send_error, http_client, ModelPrompt, ModelProvider};
use crate::error::ProviderError;
use crate::models::RawModelReply;

/// Chat-completions client for OpenAI-compatible endpoints
pub struct OpenAiClient {
    client: Client,
    url: String,
    model: String,
    api_key: String,
    timeout_seconds: u64,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        url: String,
        model: String,
        api_key: String,
        timeout_seconds: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout_seconds)?,
            url,
            model,
            api_key,
            timeout_seconds,
        })
    }

    fn completion_request<'a>(&'a self, prompt: &'a ModelPrompt) -> CompletionRequest<'a> {
        let mut messages = Vec::new();
        if let Some(sys) = &prompt.system {
            messages.push(CompletionMessage { role: "system", content: sys });
        }
        messages.push(CompletionMessage { role: "user", content: &prompt.text });

        CompletionRequest {
            model: &self.model,
            messages,
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
        }
    }
}

/// Text of the first choice, trimmed
fn first_choice_text(body: &str) -> Result<String, ProviderError> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::ParseError(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ProviderError::EmptyResponse("OpenAI".to_string()))
}

#[async_trait]
impl ModelProvider for OpenAiClient {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn generate(&self, prompt: &ModelPrompt) -> Result<RawModelReply, ProviderError> {
        debug!("Sending chat completion request to {} (model {})", self.url, self.model);

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.completion_request(prompt))
            .send()
            .await
            .map_err(|e| classify_send_error(e, "OpenAI", &self.url, self.timeout_seconds))?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::HttpError {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = first_choice_text(&body)?;
        info!("Generated {} characters", text.len());
        Ok(RawModelReply::new(text))
    }
}

//! Model provider capability and its HTTP adapters.
//!
//! Each adapter turns a [`ModelPrompt`] into one completed [`RawModelReply`].
//! Nothing above this module knows which service answered.

mod gemini;
mod ollama;
mod openai;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{AiTestGenError, ProviderError};
use crate::models::{Config, GenerationConfig, ProviderKind, RawModelReply};

/// One request to a model: prompt text plus sampling limits
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrompt {
    /// Optional system-level instruction, sent separately where the API allows
    pub system: Option<String>,
    pub text: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl ModelPrompt {
    pub fn new(text: impl Into<String>, config: &GenerationConfig) -> Self {
        Self {
            system: None,
            text: text.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Anything that can answer a prompt with raw text
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short name for logs and summaries
    fn name(&self) -> &str;

    /// Send the prompt and wait for the complete reply
    async fn generate(&self, prompt: &ModelPrompt) -> Result<RawModelReply, ProviderError>;
}

/// Shared HTTP client with the configured request timeout
pub(crate) fn http_client(timeout_seconds: u64) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| ProviderError::RequestFailed(e.to_string()))
}

/// Map a transport error, naming the endpoint on connection failures
pub(crate) fn classify_send_error(
    err: reqwest::Error,
    service: &str,
    url: &str,
    timeout_seconds: u64,
) -> ProviderError {
    if err.is_connect() {
        ProviderError::ConnectionRefused(format!("Could not connect to {} at {}", service, url))
    } else if err.is_timeout() {
        ProviderError::Timeout(timeout_seconds)
    } else {
        ProviderError::from(err)
    }
}

/// Build the adapter selected by `provider.kind`, reading API keys from the environment
pub fn create_provider(config: &Config) -> Result<Box<dyn ModelProvider>, AiTestGenError> {
    let api_key = config.resolve_api_key(|name| std::env::var(name).ok())?;
    create_provider_with_key(config, api_key)
}

/// Build the adapter selected by `provider.kind` with an explicit key
pub fn create_provider_with_key(
    config: &Config,
    api_key: Option<String>,
) -> Result<Box<dyn ModelProvider>, AiTestGenError> {
    let provider = &config.provider;
    debug!(
        "Creating {} provider for model {}",
        provider.kind,
        provider.active_model()
    );

    let key = || {
        api_key.clone().ok_or_else(|| {
            AiTestGenError::Config(crate::models::ConfigError::MissingApiKey {
                provider: provider.kind.display_name().to_string(),
                env_var: provider.kind.api_key_env_var().unwrap_or_default().to_string(),
                help_url: provider.kind.api_key_help_url().to_string(),
            })
        })
    };

    let boxed: Box<dyn ModelProvider> = match provider.kind {
        ProviderKind::Ollama => Box::new(OllamaClient::new(
            provider.ollama_url.clone(),
            provider.ollama_model.clone(),
            provider.timeout_seconds,
            config.behavior.stream_output,
        )?),
        ProviderKind::OpenAi => Box::new(OpenAiClient::new(
            provider.openai_url.clone(),
            provider.openai_model.clone(),
            key()?,
            provider.timeout_seconds,
        )?),
        ProviderKind::Gemini => Box::new(GeminiClient::new(
            provider.gemini_url.clone(),
            provider.gemini_model.clone(),
            key()?,
            provider.timeout_seconds,
        )?),
    };
    Ok(boxed)
}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{classify_send_error, http_client, ModelPrompt, ModelProvider};
use crate::error::ProviderError;
use crate::models::RawModelReply;

const TOP_P: f64 = 0.95;
const TOP_K: u32 = 40;

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    client: Client,
    url: String,
    model: String,
    api_key: String,
    timeout_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f64,
    max_output_tokens: u32,
    top_p: f64,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(
        url: String,
        model: String,
        api_key: String,
        timeout_seconds: u64,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(timeout_seconds)?,
            url: url.trim_end_matches('/').to_string(),
            model,
            api_key,
            timeout_seconds,
        })
    }

    /// Endpoint without the key, safe to log
    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.url, self.model)
    }

    fn generate_request<'a>(&self, prompt: &'a ModelPrompt) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: &prompt.text }],
            }],
            system_instruction: prompt.system.as_deref().map(|text| Content {
                parts: vec![Part { text }],
            }),
            generation_config: GenerationParams {
                temperature: prompt.temperature,
                max_output_tokens: prompt.max_tokens,
                top_p: TOP_P,
                top_k: TOP_K,
            },
        }
    }
}

/// Text of the first part of the first candidate, trimmed
fn first_candidate_text(body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::ParseError(e.to_string()))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ProviderError::EmptyResponse("Gemini".to_string()))
}

#[async_trait]
impl ModelProvider for GeminiClient {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, prompt: &ModelPrompt) -> Result<RawModelReply, ProviderError> {
        let endpoint = self.endpoint();
        debug!("Sending generateContent request to {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.generate_request(prompt))
            .send()
            .await
            .map_err(|e| classify_send_error(e.without_url(), "Gemini", &self.url, self.timeout_seconds))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ProviderError::from(e.without_url()))?;
        if !status.is_success() {
            return Err(ProviderError::HttpError {
                status: status.as_u16(),
                message: body,
            });
        }

        let text = first_candidate_text(&body)?;
        info!("Generated {} characters", text.len());
        Ok(RawModelReply::new(text))
    }
}

use std::path::PathBuf;
use thiserror::Error;

use crate::models::ConfigError;

use serde::Serialize;

/// Broad error category used by the presentation layer to pick guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing credentials or a broken config file
    Configuration,
    /// The model reply did not follow the requested marker protocol
    MalformedResponse,
    /// Network, auth or quota failure while calling the model
    Upstream,
    /// Caller bug, such as a unit request without source code
    Contract,
    /// Reading or writing project files failed
    Io,
}

/// Main error type for aitestgen
#[derive(Error, Debug)]
pub enum AiTestGenError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Response extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Contract violation: {0}")]
    ContractViolation(String),

    #[error("File store error at {path}: {source}")]
    FileStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input error: {0}")]
    Input(String),
}

/// Errors raised while pulling artifacts out of a model reply
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Response did not contain the {section} section (expected '{start_marker}' ... '{end_marker}'). Reply started with: {reply_excerpt}")]
    MissingSection {
        section: String,
        start_marker: String,
        end_marker: String,
        reply_excerpt: String,
    },
}

/// Errors related to the remote model API
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Empty response from {0}")]
    EmptyResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(0)
        } else if err.is_connect() {
            ProviderError::ConnectionRefused(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::HttpError {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ProviderError::RequestFailed(err.to_string())
        }
    }
}

impl ProviderError {
    /// Actionable hint for an HTTP failure, keyed on the status code
    pub fn http_guidance(status: u16) -> Option<&'static str> {
        match status {
            400 => Some("Invalid request. Check the generation settings in aitestgen.toml."),
            401 | 403 => Some("The API key was rejected. Check the key exported for the active provider."),
            404 => Some("Model not found. Select a different model in aitestgen.toml or with --model."),
            429 => Some("Rate limit exceeded or quota reached. Wait and retry, or check your plan's billing."),
            500 | 502 | 503 => Some("The provider is temporarily unavailable. Wait a few moments and retry."),
            _ => None,
        }
    }
}

impl AiTestGenError {
    /// Category used to select user-facing guidance
    pub fn category(&self) -> ErrorCategory {
        match self {
            AiTestGenError::Config(_) => ErrorCategory::Configuration,
            AiTestGenError::Provider(ProviderError::HttpError { status: 401 | 403, .. }) => {
                ErrorCategory::Configuration
            }
            AiTestGenError::Provider(_) => ErrorCategory::Upstream,
            AiTestGenError::Extraction(_) => ErrorCategory::MalformedResponse,
            AiTestGenError::ContractViolation(_) | AiTestGenError::Input(_) => ErrorCategory::Contract,
            AiTestGenError::FileStore { .. } | AiTestGenError::Io(_) => ErrorCategory::Io,
        }
    }

    /// Format error with guidance for display
    pub fn display_with_guidance(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let hint = match (self.category(), self) {
            (_, AiTestGenError::Provider(ProviderError::HttpError { status, .. })) => {
                ProviderError::http_guidance(*status)
            }
            (ErrorCategory::Configuration, _) => {
                Some("Reconfigure credentials or fix aitestgen.toml, then run the command again.")
            }
            (ErrorCategory::MalformedResponse, _) => {
                Some("The model response was malformed. Retry the generation.")
            }
            (ErrorCategory::Upstream, _) => {
                Some("The model service could not be reached. Check the provider URL and your network.")
            }
            _ => None,
        };

        if let Some(hint) = hint {
            output.push_str("\nSuggestion:\n");
            output.push_str(&format!("  {}\n", hint));
        }
        output
    }
}

pub type Result<T> = std::result::Result<T, AiTestGenError>;

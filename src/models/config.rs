use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Name of the project-level configuration file
pub const CONFIG_FILE_NAME: &str = "aitestgen.toml";

/// Configuration loaded from aitestgen.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub behavior: BehaviorConfig,
}

/// Remote model service backing the generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    #[value(name = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Ollama => "Ollama",
        }
    }

    /// Environment variable holding the API key, if the provider needs one
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    pub fn api_key_help_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://aistudio.google.com/app/apikey",
            ProviderKind::OpenAi => "https://platform.openai.com/api-keys",
            ProviderKind::Ollama => "",
        }
    }
}

impl Default for ProviderKind {
    fn default() -> Self {
        ProviderKind::Gemini
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Test framework the generated code targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    Junit5,
    Junit4,
}

impl TestFramework {
    pub fn display_name(&self) -> &'static str {
        match self {
            TestFramework::Junit5 => "JUnit 5",
            TestFramework::Junit4 => "JUnit 4",
        }
    }
}

impl Default for TestFramework {
    fn default() -> Self {
        TestFramework::Junit5
    }
}

/// Mocking library the generated code uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MockingLibrary {
    Mockk,
    Mockito,
}

impl MockingLibrary {
    pub fn display_name(&self) -> &'static str {
        match self {
            MockingLibrary::Mockk => "MockK",
            MockingLibrary::Mockito => "Mockito",
        }
    }
}

impl Default for MockingLibrary {
    fn default() -> Self {
        MockingLibrary::Mockk
    }
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider adapter to use
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    #[serde(default = "default_openai_url")]
    pub openai_url: String,
    #[serde(default = "default_gemini_url")]
    pub gemini_url: String,
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    /// Timeout in seconds for API requests
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            openai_model: default_openai_model(),
            gemini_model: default_gemini_model(),
            ollama_model: default_ollama_model(),
            openai_url: default_openai_url(),
            gemini_url: default_gemini_url(),
            ollama_url: default_ollama_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ProviderConfig {
    /// Model name for the active provider
    pub fn active_model(&self) -> &str {
        match self.kind {
            ProviderKind::Gemini => &self.gemini_model,
            ProviderKind::OpenAi => &self.openai_model,
            ProviderKind::Ollama => &self.ollama_model,
        }
    }

    /// Base URL for the active provider
    pub fn active_url(&self) -> &str {
        match self.kind {
            ProviderKind::Gemini => &self.gemini_url,
            ProviderKind::OpenAi => &self.openai_url,
            ProviderKind::Ollama => &self.ollama_url,
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_ollama_model() -> String {
    "qwen-32k:latest".to_string()
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1/models".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Options that shape the prompt and the sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub test_framework: TestFramework,
    #[serde(default)]
    pub mocking_library: MockingLibrary,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Generate Cucumber feature/steps/runner instead of one instrumentation class
    #[serde(default)]
    pub use_bdd: bool,
    /// Maximum number of project files embedded as context
    #[serde(default = "default_max_context_files")]
    pub max_context_files: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            test_framework: TestFramework::default(),
            mocking_library: MockingLibrary::default(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            use_bdd: false,
            max_context_files: default_max_context_files(),
        }
    }
}

fn default_temperature() -> f64 {
    0.3
}

fn default_max_tokens() -> u32 {
    8000
}

fn default_max_context_files() -> usize {
    10
}

/// Where generated artifacts live, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_unit_test_root")]
    pub unit_test_root: PathBuf,
    #[serde(default = "default_instrumentation_test_root")]
    pub instrumentation_test_root: PathBuf,
    #[serde(default = "default_features_dir")]
    pub features_dir: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            unit_test_root: default_unit_test_root(),
            instrumentation_test_root: default_instrumentation_test_root(),
            features_dir: default_features_dir(),
        }
    }
}

fn default_unit_test_root() -> PathBuf {
    PathBuf::from("app/src/test/java")
}

fn default_instrumentation_test_root() -> PathBuf {
    PathBuf::from("app/src/androidTest/java")
}

fn default_features_dir() -> PathBuf {
    PathBuf::from("app/src/androidTest/assets/features")
}

/// Behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Show streaming output in terminal (Ollama only)
    #[serde(default = "default_stream_output")]
    pub stream_output: bool,
    /// Ask before writing generated files
    #[serde(default = "default_confirm_writes")]
    pub confirm_writes: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            stream_output: default_stream_output(),
            confirm_writes: default_confirm_writes(),
        }
    }
}

fn default_stream_output() -> bool {
    true
}

fn default_confirm_writes() -> bool {
    true
}

/// CLI overrides applied on top of the file configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub url: Option<String>,
    pub timeout: Option<u64>,
    pub no_stream: bool,
    pub bdd: bool,
}

impl Config {
    /// Load config from a TOML file
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(path.clone(), e))
    }

    /// Try to load config from aitestgen.toml in the given directory
    pub fn load_from_dir(dir: &PathBuf) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge CLI overrides into the config
    ///
    /// Model and URL overrides apply to whichever provider is active after
    /// the provider override.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(kind) = overrides.provider {
            self.provider.kind = kind;
        }
        if let Some(m) = overrides.model {
            match self.provider.kind {
                ProviderKind::Gemini => self.provider.gemini_model = m,
                ProviderKind::OpenAi => self.provider.openai_model = m,
                ProviderKind::Ollama => self.provider.ollama_model = m,
            }
        }
        if let Some(u) = overrides.url {
            match self.provider.kind {
                ProviderKind::Gemini => self.provider.gemini_url = u,
                ProviderKind::OpenAi => self.provider.openai_url = u,
                ProviderKind::Ollama => self.provider.ollama_url = u,
            }
        }
        if let Some(t) = overrides.timeout {
            self.provider.timeout_seconds = t;
        }
        if overrides.no_stream {
            self.behavior.stream_output = false;
        }
        if overrides.bdd {
            self.generation.use_bdd = true;
        }
        self
    }

    /// Resolve the API key for the active provider
    ///
    /// `lookup` is the environment accessor, injected so callers and tests
    /// can substitute their own credential source.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Result<Option<String>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = self.provider.kind;
        let Some(env_var) = kind.api_key_env_var() else {
            return Ok(None);
        };

        match lookup(env_var) {
            Some(key) if !key.trim().is_empty() => Ok(Some(key.trim().to_string())),
            _ => Err(ConfigError::MissingApiKey {
                provider: kind.display_name().to_string(),
                env_var: env_var.to_string(),
                help_url: kind.api_key_help_url().to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, toml::de::Error),
    #[error("{provider} API key not configured. Export {env_var} (get a key from {help_url}).")]
    MissingApiKey {
        provider: String,
        env_var: String,
        help_url: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
        assert_eq!(config.provider.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.provider.openai_model, "gpt-4o");
        assert_eq!(config.provider.timeout_seconds, 60);
        assert_eq!(config.generation.test_framework, TestFramework::Junit5);
        assert_eq!(config.generation.mocking_library, MockingLibrary::Mockk);
        assert_eq!(config.generation.temperature, 0.3);
        assert_eq!(config.generation.max_tokens, 8000);
        assert!(!config.generation.use_bdd);
        assert_eq!(config.layout.unit_test_root, PathBuf::from("app/src/test/java"));
        assert!(config.behavior.stream_output);
        assert!(config.behavior.confirm_writes);
    }

    #[test]
    fn test_config_with_overrides() {
        let config = Config::default().with_overrides(ConfigOverrides {
            provider: Some(ProviderKind::Ollama),
            model: Some("llama3".to_string()),
            url: Some("http://remote:11434".to_string()),
            timeout: Some(600),
            no_stream: true,
            bdd: true,
        });
        assert_eq!(config.provider.kind, ProviderKind::Ollama);
        assert_eq!(config.provider.ollama_model, "llama3");
        assert_eq!(config.provider.ollama_url, "http://remote:11434");
        assert_eq!(config.provider.active_model(), "llama3");
        assert_eq!(config.provider.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.provider.timeout_seconds, 600);
        assert!(!config.behavior.stream_output);
        assert!(config.generation.use_bdd);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[provider]
kind = "openai"
openai_model = "gpt-4o-mini"

[generation]
test_framework = "junit4"
mocking_library = "mockito"
use_bdd = true

[behavior]
confirm_writes = false
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.active_model(), "gpt-4o-mini");
        assert_eq!(config.generation.test_framework, TestFramework::Junit4);
        assert_eq!(config.generation.mocking_library, MockingLibrary::Mockito);
        assert!(config.generation.use_bdd);
        assert_eq!(config.generation.max_tokens, 8000); // default
        assert!(!config.behavior.confirm_writes);
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let config = Config::default();
        let err = config.resolve_api_key(|_| None).unwrap_err();
        match err {
            ConfigError::MissingApiKey { provider, env_var, .. } => {
                assert_eq!(provider, "Gemini");
                assert_eq!(env_var, "GEMINI_API_KEY");
            }
            other => panic!("Expected MissingApiKey, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_api_key_blank_is_missing() {
        let config = Config::default();
        assert!(config.resolve_api_key(|_| Some("   ".to_string())).is_err());
    }

    #[test]
    fn test_resolve_api_key_present() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::OpenAi;
        let key = config
            .resolve_api_key(|var| (var == "OPENAI_API_KEY").then(|| "sk-test".to_string()))
            .unwrap();
        assert_eq!(key, Some("sk-test".to_string()));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let mut config = Config::default();
        config.provider.kind = ProviderKind::Ollama;
        assert_eq!(config.resolve_api_key(|_| None).unwrap(), None);
    }

    #[test]
    fn test_provider_kind_serialization() {
        assert_eq!(serde_json::to_string(&ProviderKind::OpenAi).unwrap(), "\"openai\"");
        let kind: ProviderKind = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(kind, ProviderKind::Gemini);
    }
}

//! aitestgen - LLM-backed test generator for Android projects
//!
//! aitestgen builds a prompt for one source file (unit tests) or a set of
//! project files (Compose instrumentation or Cucumber BDD tests), sends it to
//! Gemini, an OpenAI-compatible endpoint or a local Ollama instance, extracts
//! the generated code from the reply and merges new test methods into any
//! existing test file.
//!
//! # Architecture
//!
//! - **commands**: CLI command implementations (init, unit, instrumentation, preview, merge, refine)
//! - **core**: Prompt building, reply extraction, merging, providers, file store
//! - **models**: Data structures (config, request, artifacts, chat)
//! - **templates**: Prompt guidance and the default config file
//! - **error**: Error types

pub mod commands;
pub mod core;
pub mod error;
pub mod models;
pub mod templates;

pub use error::{AiTestGenError, Result};

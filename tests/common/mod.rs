//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use aitestgen::core::{FsFileStore, ModelPrompt, ModelProvider, TestGenerator};
use aitestgen::error::ProviderError;
use aitestgen::models::{Config, RawModelReply};

pub const CALCULATOR_SOURCE: &str = "app/src/main/java/com/example/calc/Calculator.kt";
pub const CALCULATOR_TEST: &str = "app/src/test/java/com/example/calc/CalculatorTest.kt";

/// Create an Android-style project with one Kotlin source file
pub fn create_android_project() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let project_root = temp_dir.path().to_path_buf();

    write_project_file(
        &project_root,
        CALCULATOR_SOURCE,
        "package com.example.calc\n\nclass Calculator {\n    fun add(a: Int, b: Int): Int = a + b\n\n    fun subtract(a: Int, b: Int): Int = a - b\n}\n",
    );

    (temp_dir, project_root)
}

/// Write a file relative to the project root, creating parent directories
pub fn write_project_file(project_root: &Path, relative: &str, content: &str) {
    let path = project_root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&path, content).expect("Failed to write project file");
}

pub fn read_project_file(project_root: &Path, relative: &str) -> String {
    fs::read_to_string(project_root.join(relative)).expect("Failed to read project file")
}

/// Provider that answers with canned replies, in order, and records prompts
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<ModelPrompt>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<ModelPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &ModelPrompt) -> Result<RawModelReply, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .map(RawModelReply::new)
            .ok_or_else(|| ProviderError::EmptyResponse("no scripted reply left".to_string()))
    }
}

/// Generator over a real project directory with the given provider
pub fn generator(
    project_root: &Path,
    config: Config,
    provider: Arc<ScriptedProvider>,
) -> (TestGenerator, Arc<FsFileStore>) {
    let store = Arc::new(FsFileStore::new(project_root.to_path_buf()));
    (TestGenerator::new(config, provider, store.clone()), store)
}

//! Artifacts extracted from a model reply and the result of merging them.

use serde::Serialize;

/// Class name substituted when the reply declares no class
pub const DEFAULT_CLASS_NAME: &str = "GeneratedTest";

/// Runner class name substituted when the runner text declares no class
pub const DEFAULT_RUNNER_CLASS_NAME: &str = "CucumberTestRunner";

/// Text returned by the remote model, untrusted and possibly malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawModelReply(pub String);

impl RawModelReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RawModelReply {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Which reply protocol the extractor should expect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    SingleFile,
    Bdd,
}

/// A single generated test source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleFileArtifact {
    pub code: String,
    /// Empty when no package declaration was found
    pub package_name: String,
    pub class_name: String,
    /// Test method names in order of appearance
    pub new_test_method_names: Vec<String>,
}

/// Feature file, step definitions and runner produced in BDD mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BddTriple {
    pub feature_file: String,
    pub step_definitions: String,
    pub test_runner: String,
    /// Package of the step definitions; empty when not declared
    pub package_name: String,
    /// Step definitions class name
    pub class_name: String,
    pub runner_class_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExtractedArtifact {
    SingleFile(SingleFileArtifact),
    Bdd(BddTriple),
}

impl ExtractedArtifact {
    pub fn package_name(&self) -> &str {
        match self {
            ExtractedArtifact::SingleFile(file) => &file.package_name,
            ExtractedArtifact::Bdd(triple) => &triple.package_name,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            ExtractedArtifact::SingleFile(file) => &file.class_name,
            ExtractedArtifact::Bdd(triple) => &triple.class_name,
        }
    }
}

/// How the candidate relates to an existing test file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeDecision {
    CreateNew,
    AppendToExisting,
}

impl MergeDecision {
    /// Append only when there is an existing file and something new to add
    pub fn choose(existing: Option<&str>, new_methods: &[String]) -> Self {
        match existing {
            Some(_) if !new_methods.is_empty() => MergeDecision::AppendToExisting,
            _ => MergeDecision::CreateNew,
        }
    }
}

/// Final file text produced by the merge engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    pub text: String,
    /// Test methods that ended up new in `text`
    pub inserted_count: usize,
    /// Append was requested but the existing file had no closing brace,
    /// so the candidate replaced it wholesale
    pub fell_back: bool,
}

//! Generation request model.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::scan_test_method_names;
use crate::error::AiTestGenError;

/// Kind of test being generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestScope {
    /// JVM unit tests for a single source file
    Unit,
    /// On-device tests for the project as a whole
    Instrumentation,
}

impl TestScope {
    pub fn display_name(&self) -> &'static str {
        match self {
            TestScope::Unit => "unit test",
            TestScope::Instrumentation => "instrumentation test",
        }
    }
}

impl fmt::Display for TestScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One project file handed to the model as context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContext {
    pub path: String,
    pub content: String,
    pub package_name: String,
}

/// Everything the prompt builder needs for one generation
///
/// Built once through [`GenerationRequestBuilder`] and read-only afterwards.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    scope: TestScope,
    target_file_path: Option<String>,
    target_class_name: Option<String>,
    source_code: Option<String>,
    existing_test_code: Option<String>,
    existing_test_methods: Vec<String>,
    project_context: Vec<FileContext>,
    use_bdd: bool,
}

impl GenerationRequest {
    pub fn builder(scope: TestScope) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            scope,
            target_file_path: None,
            target_class_name: None,
            source_code: None,
            existing_test_code: None,
            existing_test_methods: Vec::new(),
            project_context: Vec::new(),
            use_bdd: false,
        }
    }

    pub fn scope(&self) -> TestScope {
        self.scope
    }

    pub fn target_file_path(&self) -> Option<&str> {
        self.target_file_path.as_deref()
    }

    /// Fully qualified name of the class under test
    pub fn target_class_name(&self) -> Option<&str> {
        self.target_class_name.as_deref()
    }

    pub fn source_code(&self) -> Option<&str> {
        self.source_code.as_deref()
    }

    pub fn existing_test_code(&self) -> Option<&str> {
        self.existing_test_code.as_deref()
    }

    /// Test method names already present, in order of first appearance
    pub fn existing_test_methods(&self) -> &[String] {
        &self.existing_test_methods
    }

    pub fn project_context(&self) -> &[FileContext] {
        &self.project_context
    }

    /// True when the three-artifact Cucumber protocol is requested
    pub fn is_bdd(&self) -> bool {
        self.scope == TestScope::Instrumentation && self.use_bdd
    }
}

/// Builder for [`GenerationRequest`]
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    scope: TestScope,
    target_file_path: Option<String>,
    target_class_name: Option<String>,
    source_code: Option<String>,
    existing_test_code: Option<String>,
    existing_test_methods: Vec<String>,
    project_context: Vec<FileContext>,
    use_bdd: bool,
}

impl GenerationRequestBuilder {
    pub fn target_file_path(mut self, path: impl Into<String>) -> Self {
        self.target_file_path = Some(path.into());
        self
    }

    pub fn target_class_name(mut self, name: impl Into<String>) -> Self {
        self.target_class_name = Some(name.into());
        self
    }

    pub fn source_code(mut self, code: impl Into<String>) -> Self {
        self.source_code = Some(code.into());
        self
    }

    /// Attach the current test file; its test method names are scanned here
    pub fn existing_test(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        let mut names: Vec<String> = Vec::new();
        for name in scan_test_method_names(&code) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        self.existing_test_methods = names;
        self.existing_test_code = Some(code);
        self
    }

    pub fn project_context(mut self, context: Vec<FileContext>) -> Self {
        self.project_context = context;
        self
    }

    pub fn use_bdd(mut self, use_bdd: bool) -> Self {
        self.use_bdd = use_bdd;
        self
    }

    /// Finish the request; a unit request must carry source code
    pub fn build(self) -> Result<GenerationRequest, AiTestGenError> {
        if self.scope == TestScope::Unit && self.source_code.is_none() {
            return Err(AiTestGenError::ContractViolation(
                "unit test generation requires the source code under test".to_string(),
            ));
        }

        Ok(GenerationRequest {
            scope: self.scope,
            target_file_path: self.target_file_path,
            target_class_name: self.target_class_name,
            source_code: self.source_code,
            existing_test_code: self.existing_test_code,
            existing_test_methods: self.existing_test_methods,
            project_context: self.project_context,
            use_bdd: self.use_bdd,
        })
    }
}

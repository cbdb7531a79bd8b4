//! Lightweight analysis of the Kotlin or Java file under test.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

use super::parser::{scan_class_name, scan_package_name};
use crate::error::AiTestGenError;

/// Extensions accepted as source under test
pub const SOURCE_EXTENSIONS: [&str; 2] = ["kt", "java"];

static KOTLIN_FUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*((?:(?:public|private|protected|internal|open|override|suspend|inline|operator|infix|abstract|final)\s+)*)fun\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?(\w+)\s*\(")
        .expect("kotlin fun pattern")
});

static JAVA_METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*public\s+(?:(?:static|final|synchronized|abstract)\s+)*[\w<>\[\], ?]+\s+(\w+)\s*\(")
        .expect("java method pattern")
});

/// What the pipeline needs to know about a source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceAnalysis {
    /// Empty for files in the default package
    pub package_name: String,
    pub class_name: String,
    pub fully_qualified_class_name: String,
    pub source_code: String,
    pub file_path: String,
    pub public_methods: Vec<String>,
}

impl SourceAnalysis {
    /// Conventional unit test class name, `<Class>Test`
    pub fn test_class_name(&self) -> String {
        format!("{}Test", self.class_name)
    }
}

/// Analyze a Kotlin or Java source file
///
/// Files with another extension, or without a class declaration, are
/// rejected as contract violations.
pub fn analyze_source(path: &Path, text: &str) -> Result<SourceAnalysis, AiTestGenError> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if !SOURCE_EXTENSIONS.contains(&extension) {
        return Err(AiTestGenError::ContractViolation(format!(
            "{} is not a Kotlin or Java source file",
            path.display()
        )));
    }

    let class_name = scan_class_name(text).ok_or_else(|| {
        AiTestGenError::ContractViolation(format!(
            "no class declaration found in {}",
            path.display()
        ))
    })?;
    let package_name = scan_package_name(text).unwrap_or_default();
    let fully_qualified_class_name = if package_name.is_empty() {
        class_name.clone()
    } else {
        format!("{}.{}", package_name, class_name)
    };

    let public_methods = if extension == "java" {
        java_public_methods(text)
    } else {
        kotlin_public_methods(text)
    };

    Ok(SourceAnalysis {
        package_name,
        class_name,
        fully_qualified_class_name,
        source_code: text.to_string(),
        file_path: path.display().to_string(),
        public_methods,
    })
}

/// Package of a context file, empty when undeclared
pub fn derive_package(text: &str) -> String {
    scan_package_name(text).unwrap_or_default()
}

fn kotlin_public_methods(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in KOTLIN_FUN_RE.captures_iter(text) {
        let modifiers = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let hidden = modifiers
            .split_whitespace()
            .any(|m| matches!(m, "private" | "protected" | "internal"));
        if hidden {
            continue;
        }
        if let Some(name) = caps.get(2) {
            if !names.iter().any(|n| n == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}

fn java_public_methods(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in JAVA_METHOD_RE.captures_iter(text) {
        if let Some(name) = caps.get(1) {
            if !names.iter().any(|n| n == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
    }
    names
}

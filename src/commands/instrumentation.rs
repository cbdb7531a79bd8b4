use std::path::{Path, PathBuf};
use tracing::info;

use super::unit::{relative_to_root, write_generated};
use super::{open_project, GenerateOptions};
use crate::core::{FileInserter, TestGenerator};
use crate::error::AiTestGenError;

/// Project name used for test class naming when none is given
pub fn default_project_name(project_root: &Path) -> String {
    project_root
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(project_root)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("App")
        .to_string()
}

/// Generate Compose instrumentation tests (or the Cucumber triple) for the project
pub async fn generate_instrumentation_tests(
    project_root: &PathBuf,
    context: &[PathBuf],
    bdd: bool,
    project_name: Option<String>,
    options: GenerateOptions,
) -> Result<(), AiTestGenError> {
    let (config, provider, store) = open_project(project_root, options.overrides(bdd))?;
    let project_name = project_name.unwrap_or_else(|| default_project_name(project_root));
    let context: Vec<PathBuf> = context
        .iter()
        .map(|path| relative_to_root(project_root, path))
        .collect();

    info!(
        "Generating {} for {} with {} context file(s)",
        if config.generation.use_bdd { "Cucumber BDD tests" } else { "instrumentation tests" },
        project_name,
        context.len()
    );

    let generator = TestGenerator::new(config.clone(), provider, store.clone());
    let generated = generator
        .generate_instrumentation_test(&project_name, &context)
        .await?;

    let inserter = FileInserter::new(store, generator.layout().clone());
    write_generated(&generated, &config, options.yes, inserter)
}

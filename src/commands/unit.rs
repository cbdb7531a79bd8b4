use std::path::{Path, PathBuf};
use tracing::info;

use super::{confirm_write, open_project, print_code, GenerateOptions};
use crate::core::{FileInserter, GeneratedTest, TestGenerator};
use crate::error::AiTestGenError;
use crate::models::Config;

/// Generate unit tests for one source file and write them after confirmation
pub async fn generate_unit_tests(
    project_root: &PathBuf,
    source: &Path,
    options: GenerateOptions,
) -> Result<(), AiTestGenError> {
    let (config, provider, store) = open_project(project_root, options.overrides(false))?;
    let generator = TestGenerator::new(config.clone(), provider, store.clone());

    let source = relative_to_root(project_root, source);
    info!("Generating unit tests for {}", source.display());
    let generated = generator.generate_unit_test(&source).await?;

    let inserter = FileInserter::new(store, generator.layout().clone());
    write_generated(&generated, &config, options.yes, inserter)
}

/// Show the result, ask, and hand it to the inserter
pub(crate) fn write_generated(
    generated: &GeneratedTest,
    config: &Config,
    assume_yes: bool,
    inserter: FileInserter,
) -> Result<(), AiTestGenError> {
    match &generated.bdd {
        Some(triple) => {
            let [feature, steps, runner] = inserter.bdd_paths(triple);
            print_code(&feature, &triple.feature_file);
            print_code(&steps, &triple.step_definitions);
            print_code(&runner, &triple.test_runner);
        }
        None => print_code(&generated.output_path, &generated.code),
    }

    let action = if generated.is_update { "Update" } else { "Create" };
    let prompt = format!("{} {}?", action, generated.output_path.display());
    if !confirm_write(config, assume_yes, &prompt)? {
        println!("Discarded generated tests.");
        return Ok(());
    }

    let result = inserter.insert(generated)?;
    println!("{}", result.message);
    Ok(())
}

/// Absolute paths inside the project become project-relative
pub(crate) fn relative_to_root(project_root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(project_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

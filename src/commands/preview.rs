use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::instrumentation::default_project_name;
use super::unit::relative_to_root;
use crate::core::{load_config, FsFileStore, PreparedRequest, RequestPlanner};
use crate::error::AiTestGenError;
use crate::models::ConfigOverrides;

fn planner(project_root: &PathBuf, bdd: bool) -> Result<RequestPlanner, AiTestGenError> {
    let overrides = ConfigOverrides {
        bdd,
        ..ConfigOverrides::default()
    };
    let config = load_config(project_root, overrides)?;
    Ok(RequestPlanner::new(
        config,
        Arc::new(FsFileStore::new(project_root.clone())),
    ))
}

/// Print the prompt for a unit test request without calling the model
pub fn preview_unit(project_root: &PathBuf, source: &Path) -> Result<(), AiTestGenError> {
    let planner = planner(project_root, false)?;
    let prepared = planner.prepare_unit(&relative_to_root(project_root, source))?;

    println!("=== UNIT TEST PREVIEW: {} ===\n", source.display());
    if let Some(analysis) = &prepared.analysis {
        println!("Class: {}", analysis.fully_qualified_class_name);
        if !analysis.public_methods.is_empty() {
            println!("Public methods: {}", analysis.public_methods.join(", "));
        }
    }
    print_prepared(&prepared, planner.config().provider.active_model());
    Ok(())
}

/// Print the prompt for an instrumentation request without calling the model
pub fn preview_instrumentation(
    project_root: &PathBuf,
    context: &[PathBuf],
    bdd: bool,
    project_name: Option<String>,
) -> Result<(), AiTestGenError> {
    let planner = planner(project_root, bdd)?;
    let project_name = project_name.unwrap_or_else(|| default_project_name(project_root));
    let context: Vec<PathBuf> = context
        .iter()
        .map(|path| relative_to_root(project_root, path))
        .collect();
    let prepared = planner.prepare_instrumentation(&project_name, &context)?;

    println!("=== INSTRUMENTATION TEST PREVIEW: {} ===\n", project_name);
    println!("Mode: {}", if prepared.request.is_bdd() { "Cucumber BDD" } else { "Compose" });
    println!("Context files: {}", prepared.request.project_context().len());
    print_prepared(&prepared, planner.config().provider.active_model());
    Ok(())
}

fn print_prepared(prepared: &PreparedRequest, model: &str) {
    println!("Model: {}", model);
    match prepared.request.existing_test_code() {
        Some(_) => println!(
            "Existing test file: {} ({} test methods)",
            prepared.existing_path.display(),
            prepared.request.existing_test_methods().len()
        ),
        None => println!("Existing test file: none"),
    }

    if let Some(system) = &prepared.prompt.system {
        println!("\n=== SYSTEM PROMPT ===");
        println!("{}", system);
    }

    println!("\n=== PROMPT ===");
    println!("{}", prepared.prompt.text);
    println!("=== END PREVIEW ({} chars) ===", prepared.prompt.text.len());
}

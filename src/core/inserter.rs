use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::generator::GeneratedTest;
use crate::core::layout::TestLayout;
use crate::core::FileStore;
use crate::error::AiTestGenError;
use crate::models::BddTriple;

/// Summary of what was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionResult {
    /// Human-readable summary for the terminal
    pub message: String,
    pub paths: Vec<PathBuf>,
}

/// Writes generated tests into the project through a [`FileStore`]
pub struct FileInserter {
    store: Arc<dyn FileStore>,
    layout: TestLayout,
}

impl FileInserter {
    pub fn new(store: Arc<dyn FileStore>, layout: TestLayout) -> Self {
        Self { store, layout }
    }

    fn write_file(&self, path: &Path, text: &str) -> Result<(), AiTestGenError> {
        if let Some(parent) = path.parent() {
            self.store.ensure_directory(parent)?;
        }
        self.store.write(path, text)
    }

    /// Paths of the three BDD files, in feature/steps/runner order
    pub fn bdd_paths(&self, triple: &BddTriple) -> [PathBuf; 3] {
        [
            self.layout.feature_file_path(&triple.class_name),
            self.layout
                .step_definitions_path(&triple.package_name, &triple.class_name),
            self.layout
                .test_runner_path(&triple.package_name, &triple.runner_class_name),
        ]
    }

    pub fn insert(&self, generated: &GeneratedTest) -> Result<InsertionResult, AiTestGenError> {
        match &generated.bdd {
            Some(triple) => self.insert_bdd(generated, triple),
            None => self.insert_single(generated),
        }
    }

    fn insert_single(&self, generated: &GeneratedTest) -> Result<InsertionResult, AiTestGenError> {
        let path = &generated.output_path;

        if generated.is_update && generated.new_methods_count == 0 && !generated.merge_fell_back {
            info!("Nothing to write for {}", path.display());
            return Ok(InsertionResult {
                message: format!(
                    "No new test methods to add. {} is unchanged.",
                    path.display()
                ),
                paths: Vec::new(),
            });
        }

        self.write_file(path, &generated.code)?;

        let mut message = if generated.is_update {
            format!(
                "Added {} new test method(s) to {}\nClass: {}.{}",
                generated.new_methods_count,
                path.display(),
                generated.package_name,
                generated.class_name
            )
        } else {
            format!(
                "Created {} with {} test method(s)\nClass: {}.{}",
                path.display(),
                generated.new_methods_count,
                generated.package_name,
                generated.class_name
            )
        };

        if generated.merge_fell_back {
            warn!("{} was rewritten instead of appended to", path.display());
            message.push_str(
                "\nWarning: the existing file could not be parsed, so it was replaced by the generated file instead of being appended to.",
            );
        }

        info!("Wrote {}", path.display());
        Ok(InsertionResult {
            message,
            paths: vec![path.clone()],
        })
    }

    fn insert_bdd(
        &self,
        generated: &GeneratedTest,
        triple: &BddTriple,
    ) -> Result<InsertionResult, AiTestGenError> {
        let paths = self.bdd_paths(triple);
        let [feature, steps, runner] = &paths;

        self.write_file(feature, &triple.feature_file)?;
        self.write_file(steps, &triple.step_definitions)?;
        self.write_file(runner, &triple.test_runner)?;
        info!("Wrote BDD files for {}", triple.class_name);

        let message = format!(
            "Created Cucumber BDD tests ({} scenario(s)):\n  Feature: {}\n  Steps:   {}\n  Runner:  {}",
            generated.new_methods_count,
            feature.display(),
            steps.display(),
            runner.display()
        );

        Ok(InsertionResult {
            message,
            paths: paths.to_vec(),
        })
    }
}

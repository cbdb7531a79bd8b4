use std::path::{Path, PathBuf};

use super::source::SourceAnalysis;
use crate::models::LayoutConfig;

/// Suffix stripped from a step definitions class to name its feature file
const STEP_DEFINITIONS_SUFFIX: &str = "StepDefinitions";

/// Maps packages and class names onto project-relative file paths
#[derive(Debug, Clone)]
pub struct TestLayout {
    config: LayoutConfig,
}

impl TestLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// `a.b.c` becomes `a/b/c`; the empty package maps to no directories
    pub fn package_dir(package_name: &str) -> PathBuf {
        package_name
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    fn source_file(root: &Path, package_name: &str, class_name: &str) -> PathBuf {
        root.join(Self::package_dir(package_name))
            .join(format!("{}.kt", class_name))
    }

    pub fn unit_test_path(&self, package_name: &str, class_name: &str) -> PathBuf {
        Self::source_file(&self.config.unit_test_root, package_name, class_name)
    }

    /// Where the conventional test for a source class lives
    pub fn existing_unit_test_path(&self, analysis: &SourceAnalysis) -> PathBuf {
        self.unit_test_path(&analysis.package_name, &analysis.test_class_name())
    }

    pub fn instrumentation_test_path(&self, package_name: &str, class_name: &str) -> PathBuf {
        Self::source_file(
            &self.config.instrumentation_test_root,
            package_name,
            class_name,
        )
    }

    /// Project-level instrumentation test, kept directly under the root
    pub fn existing_instrumentation_test_path(&self, project_name: &str) -> PathBuf {
        self.config
            .instrumentation_test_root
            .join(format!("{}.kt", instrumented_test_class_name(project_name)))
    }

    pub fn feature_file_path(&self, step_class_name: &str) -> PathBuf {
        let base = step_class_name
            .strip_suffix(STEP_DEFINITIONS_SUFFIX)
            .filter(|base| !base.is_empty())
            .unwrap_or(step_class_name);
        self.config.features_dir.join(format!("{}.feature", base))
    }

    pub fn step_definitions_path(&self, package_name: &str, class_name: &str) -> PathBuf {
        self.instrumentation_test_path(package_name, class_name)
    }

    pub fn test_runner_path(&self, package_name: &str, runner_class_name: &str) -> PathBuf {
        self.instrumentation_test_path(package_name, runner_class_name)
    }
}

/// `my-app_x` becomes `myappx`
fn strip_separators(project_name: &str) -> String {
    project_name.chars().filter(|c| *c != '-' && *c != '_').collect()
}

/// `<ProjectName>InstrumentedTest` with `-` and `_` removed
pub fn instrumented_test_class_name(project_name: &str) -> String {
    format!("{}InstrumentedTest", strip_separators(project_name))
}

/// Package used when no context file declares one
pub fn default_base_package(project_name: &str) -> String {
    strip_separators(project_name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TestLayout {
        TestLayout::new(LayoutConfig::default())
    }

    #[test]
    fn test_package_dir() {
        assert_eq!(TestLayout::package_dir("com.example.app"), PathBuf::from("com/example/app"));
        assert_eq!(TestLayout::package_dir(""), PathBuf::new());
    }

    #[test]
    fn test_unit_paths() {
        assert_eq!(
            layout().unit_test_path("com.example", "CalcTest"),
            PathBuf::from("app/src/test/java/com/example/CalcTest.kt")
        );
        assert_eq!(
            layout().unit_test_path("", "CalcTest"),
            PathBuf::from("app/src/test/java/CalcTest.kt")
        );
    }

    #[test]
    fn test_existing_instrumentation_path() {
        assert_eq!(
            layout().existing_instrumentation_test_path("My-Cool_App"),
            PathBuf::from("app/src/androidTest/java/MyCoolAppInstrumentedTest.kt")
        );
    }

    #[test]
    fn test_bdd_paths() {
        let layout = layout();
        assert_eq!(
            layout.feature_file_path("LoginStepDefinitions"),
            PathBuf::from("app/src/androidTest/assets/features/Login.feature")
        );
        assert_eq!(
            layout.feature_file_path("StepDefinitions"),
            PathBuf::from("app/src/androidTest/assets/features/StepDefinitions.feature")
        );
        assert_eq!(
            layout.test_runner_path("com.example.steps", "CucumberTestRunner"),
            PathBuf::from("app/src/androidTest/java/com/example/steps/CucumberTestRunner.kt")
        );
    }

    #[test]
    fn test_default_base_package() {
        assert_eq!(default_base_package("My-Cool_App"), "mycoolapp");
        assert_eq!(instrumented_test_class_name("shop"), "shopInstrumentedTest");
    }
}

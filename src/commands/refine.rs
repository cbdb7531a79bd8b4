use std::path::Path;
use tracing::info;

use super::{confirm_write, open_project, print_code, GenerateOptions};
use crate::core::{scan_class_name, scan_package_name, FileStore, TestGenerator};
use crate::error::AiTestGenError;
use crate::models::{RefineContext, TestScope};

/// Tests under an `androidTest` source set run on a device
pub fn infer_scope(test_file: &Path) -> TestScope {
    let on_device = test_file
        .components()
        .any(|c| c.as_os_str() == "androidTest");
    if on_device {
        TestScope::Instrumentation
    } else {
        TestScope::Unit
    }
}

/// Seed a refinement session from a test file on disk
pub fn refine_context_for(test_file: &Path, code: String) -> RefineContext {
    let package_name = scan_package_name(&code).unwrap_or_default();
    let mut context = RefineContext::new(code, infer_scope(test_file), package_name);
    context.target_class_name = scan_class_name(&context.original_code)
        .map(|name| name.strip_suffix("Test").unwrap_or(&name).to_string());
    context
}

/// Run one refinement round per message, each building on the last
pub async fn refine_rounds(
    generator: &TestGenerator,
    context: &mut RefineContext,
    messages: &[String],
) -> Result<(), AiTestGenError> {
    for (round, message) in messages.iter().enumerate() {
        info!("Refinement round {}/{}: {}", round + 1, messages.len(), message);
        let refinement = generator.refine(context, message).await?;
        println!("{}", refinement.explanation);
        context.apply(message, &refinement);
    }
    Ok(())
}

/// Apply natural-language change requests to an existing test file
pub async fn refine_test(
    project_root: &Path,
    test_file: &Path,
    messages: &[String],
    options: GenerateOptions,
) -> Result<(), AiTestGenError> {
    let (config, provider, store) = open_project(project_root, options.overrides(false))?;
    let code = store.read(test_file)?.ok_or_else(|| {
        AiTestGenError::Input(format!("Test file not found: {}", test_file.display()))
    })?;
    let generator = TestGenerator::new(config.clone(), provider, store.clone());

    let mut context = refine_context_for(test_file, code);
    info!("Refining {} ({})", test_file.display(), context.scope);
    refine_rounds(&generator, &mut context, messages).await?;

    print_code(test_file, &context.current_code);
    if context.current_code.trim() == context.original_code.trim() {
        println!("No changes to {}.", test_file.display());
        return Ok(());
    }

    let prompt = format!("Update {}?", test_file.display());
    if !confirm_write(&config, options.yes, &prompt)? {
        println!("Discarded refinement.");
        return Ok(());
    }

    store.write(test_file, &context.current_code)?;
    println!("Updated {}", test_file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MemoryFileStore, ModelPrompt, ModelProvider};
    use crate::error::ProviderError;
    use crate::models::{ChatRole, Config, RawModelReply};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Appends a marker comment to whatever code it is shown
    struct AppendingProvider {
        rounds: Mutex<usize>,
    }

    #[async_trait]
    impl ModelProvider for AppendingProvider {
        fn name(&self) -> &str {
            "appending"
        }

        async fn generate(&self, prompt: &ModelPrompt) -> Result<RawModelReply, ProviderError> {
            let mut rounds = self.rounds.lock().unwrap();
            *rounds += 1;
            let code = if prompt.text.contains("// round 1") {
                "class CalculatorTest {}\n// round 1\n// round 2"
            } else {
                "class CalculatorTest {}\n// round 1"
            };
            Ok(RawModelReply::new(format!(
                "=== CODE START ===\n{}\n=== CODE END ===\n=== EXPLANATION START ===\nround {}\n=== EXPLANATION END ===",
                code, rounds
            )))
        }
    }

    #[test]
    fn test_infer_scope() {
        assert_eq!(
            infer_scope(Path::new("app/src/androidTest/java/com/x/AppTest.kt")),
            TestScope::Instrumentation
        );
        assert_eq!(
            infer_scope(Path::new("app/src/test/java/com/x/FooTest.kt")),
            TestScope::Unit
        );
    }

    #[test]
    fn test_refine_context_for() {
        let code = "package com.x\n\nclass CalculatorTest {\n}\n".to_string();
        let context = refine_context_for(Path::new("app/src/test/java/com/x/CalculatorTest.kt"), code);
        assert_eq!(context.package_name, "com.x");
        assert_eq!(context.scope, TestScope::Unit);
        assert_eq!(context.target_class_name.as_deref(), Some("Calculator"));
        assert_eq!(context.original_code, context.current_code);
    }

    #[test]
    fn test_refine_rounds_build_on_each_other() {
        let provider = Arc::new(AppendingProvider {
            rounds: Mutex::new(0),
        });
        let generator = TestGenerator::new(
            Config::default(),
            provider,
            Arc::new(MemoryFileStore::new()),
        );
        let mut context = refine_context_for(
            Path::new("app/src/test/java/CalculatorTest.kt"),
            "class CalculatorTest {}".to_string(),
        );
        let messages = vec!["add a comment".to_string(), "add another".to_string()];

        tokio_test::block_on(refine_rounds(&generator, &mut context, &messages)).unwrap();

        assert_eq!(context.current_code, "class CalculatorTest {}\n// round 1\n// round 2");
        assert_eq!(context.original_code, "class CalculatorTest {}");
        assert_eq!(context.messages.len(), 4);
        assert_eq!(context.messages[0].role, ChatRole::User);
        assert_eq!(context.messages[3].content, "round 2");
    }
}

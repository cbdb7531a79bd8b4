//! Integration tests for the generation pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aitestgen::core::{
    extract_bdd, extract_single_file, merge_test_code, scan_test_method_names, FileInserter,
};
use aitestgen::error::{AiTestGenError, ExtractionError};
use aitestgen::models::{Config, MergeDecision, RawModelReply, TestScope};

mod common;

use common::{
    create_android_project, generator, read_project_file, write_project_file, ScriptedProvider,
    CALCULATOR_SOURCE, CALCULATOR_TEST,
};

const FIRST_REPLY: &str = r#"Here are the tests:

```kotlin
package com.example.calc

import org.junit.jupiter.api.Test
import org.junit.jupiter.api.Assertions.assertEquals

class CalculatorTest {
    @Test
    fun addsNumbers() {
        assertEquals(3, Calculator().add(1, 2))
    }
}
```
"#;

const SECOND_REPLY: &str = r#"```kotlin
package com.example.calc

import org.junit.jupiter.api.Test
import org.junit.jupiter.api.Assertions.assertEquals

class CalculatorTest {
    @Test
    fun addsNumbers() {
        assertEquals(3, Calculator().add(1, 2))
    }

    @Test
    fun subtractsNumbers() {
        val result = Calculator().subtract(5, 2)
        if (result != 3) { throw AssertionError("}") }
        assertEquals(3, result)
    }
}
```"#;

const BDD_REPLY: &str = r#"=== FEATURE FILE START ===
Feature: Login
  Scenario: Successful login
    Given the login screen is shown
    When the user signs in
    Then the home screen is shown

  Scenario: Wrong password
    Given the login screen is shown
    When the user enters a wrong password
    Then an error is shown
=== FEATURE FILE END ===

=== STEP DEFINITIONS START ===
```kotlin
package com.shop.bdd

class LoginStepDefinitions {
    @Given("the login screen is shown")
    fun loginScreenShown() {}
}
```
=== STEP DEFINITIONS END ===

=== TEST RUNNER START ===
```kotlin
package com.shop.bdd

class ShopCucumberRunner : CucumberAndroidJUnitRunner()
```
=== TEST RUNNER END ===
"#;

fn unit_source() -> PathBuf {
    PathBuf::from(CALCULATOR_SOURCE)
}

fn bdd_config() -> Config {
    let mut config = Config::default();
    config.generation.use_bdd = true;
    config
}

#[tokio::test]
async fn test_unit_pipeline_creates_new_file() {
    let (_temp_dir, project_root) = create_android_project();
    let provider = Arc::new(ScriptedProvider::new(&[FIRST_REPLY]));
    let (generator, store) = generator(&project_root, Config::default(), provider.clone());

    let generated = generator.generate_unit_test(&unit_source()).await.unwrap();
    assert!(!generated.is_update);
    assert_eq!(generated.scope, TestScope::Unit);
    assert_eq!(generated.new_methods_count, 1);
    assert_eq!(generated.output_path, PathBuf::from(CALCULATOR_TEST));
    assert_eq!(generated.package_name, "com.example.calc");
    assert_eq!(generated.class_name, "CalculatorTest");

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].text.contains("class Calculator"));
    assert!(prompts[0].system.is_some());

    let inserter = FileInserter::new(store, generator.layout().clone());
    let result = inserter.insert(&generated).unwrap();
    assert!(result.message.starts_with("Created"));
    assert_eq!(result.paths, vec![PathBuf::from(CALCULATOR_TEST)]);

    let written = read_project_file(&project_root, CALCULATOR_TEST);
    assert_eq!(scan_test_method_names(&written), vec!["addsNumbers"]);
    assert!(!written.contains("```"));
}

#[tokio::test]
async fn test_unit_pipeline_appends_only_new_methods() {
    let (_temp_dir, project_root) = create_android_project();
    let existing = extract_single_file(&RawModelReply::new(FIRST_REPLY)).code + "\n";
    write_project_file(&project_root, CALCULATOR_TEST, &existing);

    let provider = Arc::new(ScriptedProvider::new(&[SECOND_REPLY]));
    let (generator, store) = generator(&project_root, Config::default(), provider.clone());

    let generated = generator.generate_unit_test(&unit_source()).await.unwrap();
    assert!(generated.is_update);
    assert_eq!(generated.new_methods_count, 1);
    assert!(!generated.merge_fell_back);

    // The prompt told the model what already exists
    let prompt = &provider.prompts()[0].text;
    assert!(prompt.contains("- addsNumbers"));

    let inserter = FileInserter::new(store, generator.layout().clone());
    let result = inserter.insert(&generated).unwrap();
    assert!(result.message.contains("Added 1 new test method(s)"));

    let written = read_project_file(&project_root, CALCULATOR_TEST);
    assert_eq!(
        scan_test_method_names(&written),
        vec!["addsNumbers", "subtractsNumbers"]
    );
    assert!(written.contains("AI Generated Tests"));
    assert!(written.contains("throw AssertionError(\"}\")"));

    // Prefix up to the old closing brace is untouched, suffix is preserved
    let old_close = existing.rfind('}').unwrap();
    assert!(written.starts_with(&existing[..old_close]));
    assert!(written.ends_with("}\n"));
}

#[tokio::test]
async fn test_unit_pipeline_second_pass_inserts_nothing() {
    let (_temp_dir, project_root) = create_android_project();
    let provider = Arc::new(ScriptedProvider::new(&[SECOND_REPLY, SECOND_REPLY]));
    let (generator, store) = generator(&project_root, Config::default(), provider);
    let inserter = FileInserter::new(store, generator.layout().clone());

    let first = generator.generate_unit_test(&unit_source()).await.unwrap();
    inserter.insert(&first).unwrap();
    let after_first = read_project_file(&project_root, CALCULATOR_TEST);

    let second = generator.generate_unit_test(&unit_source()).await.unwrap();
    assert!(second.is_update);
    assert_eq!(second.new_methods_count, 0);
    assert_eq!(second.code, after_first);

    let result = inserter.insert(&second).unwrap();
    assert!(result.paths.is_empty());
    assert_eq!(read_project_file(&project_root, CALCULATOR_TEST), after_first);
}

#[tokio::test]
async fn test_unit_pipeline_rejects_unsupported_source() {
    let (_temp_dir, project_root) = create_android_project();
    write_project_file(&project_root, "app/src/main/res/values/strings.xml", "<resources/>");
    let provider = Arc::new(ScriptedProvider::new(&[FIRST_REPLY]));
    let (generator, _store) = generator(&project_root, Config::default(), provider.clone());

    let err = generator
        .generate_unit_test(Path::new("app/src/main/res/values/strings.xml"))
        .await
        .unwrap_err();
    assert!(matches!(err, AiTestGenError::ContractViolation(_)));
    assert!(provider.prompts().is_empty());
}

#[tokio::test]
async fn test_bdd_pipeline_writes_three_files() {
    let (_temp_dir, project_root) = create_android_project();
    let provider = Arc::new(ScriptedProvider::new(&[BDD_REPLY]));
    let (generator, store) = generator(&project_root, bdd_config(), provider.clone());

    let generated = generator
        .generate_instrumentation_test("shop-app", &[])
        .await
        .unwrap();
    assert_eq!(generated.scope, TestScope::Instrumentation);
    assert_eq!(generated.new_methods_count, 2);
    let triple = generated.bdd.as_ref().unwrap();
    assert_eq!(triple.package_name, "com.shop.bdd");
    assert_eq!(triple.class_name, "LoginStepDefinitions");
    assert_eq!(triple.runner_class_name, "ShopCucumberRunner");

    assert!(provider.prompts()[0].text.contains("=== TEST RUNNER START ==="));

    let inserter = FileInserter::new(store, generator.layout().clone());
    let result = inserter.insert(&generated).unwrap();
    assert_eq!(result.paths.len(), 3);

    let feature = read_project_file(&project_root, "app/src/androidTest/assets/features/Login.feature");
    assert!(feature.starts_with("Feature: Login"));
    let steps = read_project_file(
        &project_root,
        "app/src/androidTest/java/com/shop/bdd/LoginStepDefinitions.kt",
    );
    assert!(steps.contains("fun loginScreenShown()"));
    assert!(!steps.contains("```"));
    let runner = read_project_file(
        &project_root,
        "app/src/androidTest/java/com/shop/bdd/ShopCucumberRunner.kt",
    );
    assert!(runner.contains("CucumberAndroidJUnitRunner"));
}

#[tokio::test]
async fn test_bdd_pipeline_missing_runner_fails() {
    let (_temp_dir, project_root) = create_android_project();
    let cut = BDD_REPLY.find("=== TEST RUNNER START ===").unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[&BDD_REPLY[..cut]]));
    let (generator, _store) = generator(&project_root, bdd_config(), provider);

    let err = generator
        .generate_instrumentation_test("shop-app", &[])
        .await
        .unwrap_err();
    match err {
        AiTestGenError::Extraction(ExtractionError::MissingSection { section, .. }) => {
            assert_eq!(section, "TEST RUNNER");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!project_root.join("app/src/androidTest").exists());
}

#[tokio::test]
async fn test_instrumentation_pipeline_defaults() {
    let (_temp_dir, project_root) = create_android_project();
    write_project_file(
        &project_root,
        "app/src/main/java/com/shop/ui/LoginScreen.kt",
        "package com.shop.ui\n\n@Composable\nfun LoginScreen() {}\n",
    );
    let reply = "```kotlin\nimport org.junit.Test\n\n@Test\nfun showsLogin() {\n    composeTestRule.onNodeWithText(\"Login\").assertExists()\n}\n```";
    let provider = Arc::new(ScriptedProvider::new(&[reply]));
    let (generator, _store) = generator(&project_root, Config::default(), provider.clone());

    let generated = generator
        .generate_instrumentation_test(
            "shop-app",
            &[PathBuf::from("app/src/main/java/com/shop/ui/LoginScreen.kt")],
        )
        .await
        .unwrap();

    assert_eq!(generated.package_name, "com.shop.ui");
    assert_eq!(generated.class_name, "shopappInstrumentedTest");
    assert_eq!(
        generated.output_path,
        PathBuf::from("app/src/androidTest/java/com/shop/ui/shopappInstrumentedTest.kt")
    );
    assert_eq!(generated.new_methods_count, 1);

    let prompt = &provider.prompts()[0].text;
    assert!(prompt.contains("### File: app/src/main/java/com/shop/ui/LoginScreen.kt"));
    assert!(prompt.contains("fun LoginScreen()"));
}

#[tokio::test]
async fn test_refine_round() {
    let (_temp_dir, project_root) = create_android_project();
    let reply = "=== CODE START ===\nclass CalculatorTest { @Test fun nulls() {} }\n=== CODE END ===\n=== EXPLANATION START ===\nAdded a null check.\n=== EXPLANATION END ===";
    let provider = Arc::new(ScriptedProvider::new(&[reply]));
    let (generator, _store) = generator(&project_root, Config::default(), provider.clone());

    let mut context = aitestgen::models::RefineContext::new(
        "class CalculatorTest {}",
        TestScope::Unit,
        "com.example.calc",
    );
    let refinement = generator.refine(&context, "add a null test").await.unwrap();
    assert_eq!(refinement.explanation, "Added a null check.");
    assert!(refinement.code.contains("fun nulls()"));

    context.apply("add a null test", &refinement);
    assert_eq!(context.current_code, refinement.code);
    assert_eq!(context.messages.len(), 2);
    assert!(provider.prompts()[0].text.contains("add a null test"));
}

#[test]
fn test_merge_scenarios_end_to_end() {
    // Candidate metadata
    let candidate = "package p\nclass FooTest {\n  @Test fun a() { assert(true) }\n}";
    let artifact = extract_single_file(&RawModelReply::new(candidate));
    assert_eq!(artifact.package_name, "p");
    assert_eq!(artifact.class_name, "FooTest");
    assert_eq!(artifact.new_test_method_names, vec!["a"]);

    // Append
    let existing = "class FooTest {\n  @Test fun a() {}\n}";
    let candidate = "class FooTest {\n  @Test fun a() {}\n  @Test fun b() { x() }\n}";
    let new_methods = vec!["b".to_string()];
    let merged = merge_test_code(
        MergeDecision::choose(Some(existing), &new_methods),
        Some(existing),
        candidate,
        &new_methods,
    );
    assert!(merged.text.contains("fun a()"));
    assert!(merged.text.contains("fun b()"));
    assert_eq!(merged.inserted_count, 1);

    // Missing closing delimiter
    let broken = "package p\nclass FooTest\n";
    let merged = merge_test_code(MergeDecision::AppendToExisting, Some(broken), candidate, &new_methods);
    assert_eq!(merged.text, candidate);
    assert!(merged.fell_back);

    // BDD without runner
    let reply = "=== FEATURE FILE START ===\nFeature: x\n=== FEATURE FILE END ===\n=== STEP DEFINITIONS START ===\nclass S\n=== STEP DEFINITIONS END ===";
    assert!(matches!(
        extract_bdd(&RawModelReply::new(reply)),
        Err(ExtractionError::MissingSection { .. })
    ));
}

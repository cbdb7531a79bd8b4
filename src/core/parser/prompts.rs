//! Prompt assembly for generation and refinement requests.
//!
//! Every builder here is a pure function of its inputs. The emitted text
//! always carries the existing test method names, the existing test file and
//! the marker pairs the extractor searches for.

use super::{
    SectionMarkers, CODE_MARKERS, EXPLANATION_MARKERS, FEATURE_FILE_MARKERS,
    STEP_DEFINITIONS_MARKERS, TEST_FILE_MARKERS, TEST_RUNNER_MARKERS,
};
use crate::models::{
    ExtractionMode, FileContext, GenerationConfig, GenerationRequest, RefineContext, TestScope,
    DEFAULT_RUNNER_CLASS_NAME,
};
use crate::templates;

/// Package used in BDD prompts when nothing better is known
pub const FALLBACK_BASE_PACKAGE: &str = "com.example.test";

/// Reply protocol a request asks the model to follow
pub fn extraction_mode(request: &GenerationRequest) -> ExtractionMode {
    if request.is_bdd() {
        ExtractionMode::Bdd
    } else {
        ExtractionMode::SingleFile
    }
}

/// Render a generation request into the prompt text sent to the model
pub fn build_prompt(request: &GenerationRequest, config: &GenerationConfig) -> String {
    match (request.scope(), request.is_bdd()) {
        (TestScope::Unit, _) => build_unit_prompt(request, config),
        (TestScope::Instrumentation, false) => build_instrumentation_prompt(request, config),
        (TestScope::Instrumentation, true) => build_bdd_prompt(request, config),
    }
}

fn push_code_block(prompt: &mut String, language: &str, content: &str) {
    prompt.push_str("```");
    prompt.push_str(language);
    prompt.push('\n');
    prompt.push_str(content);
    if !content.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str("```\n\n");
}

fn push_marker_region(prompt: &mut String, markers: &SectionMarkers, placeholder: &str) {
    prompt.push_str(markers.start);
    prompt.push('\n');
    prompt.push_str(placeholder);
    prompt.push('\n');
    prompt.push_str(markers.end);
    prompt.push_str("\n\n");
}

fn push_existing_tests(prompt: &mut String, request: &GenerationRequest) {
    let names = request.existing_test_methods();
    if !names.is_empty() {
        prompt.push_str("[EXISTING TEST METHODS]\n");
        prompt.push_str("Existing test methods (DO NOT regenerate these):\n");
        for name in names {
            prompt.push_str(&format!("- {}\n", name));
        }
        prompt.push('\n');
    }

    if let Some(existing) = request.existing_test_code() {
        prompt.push_str("[EXISTING TEST FILE]\n");
        prompt.push_str(
            "This test file already exists. Only generate NEW test methods that don't duplicate existing ones.\n",
        );
        push_code_block(prompt, "kotlin", existing);
    }
}

fn push_project_context(prompt: &mut String, context: &[FileContext], limit: usize, empty_note: &str) {
    prompt.push_str("[PROJECT CONTEXT]\n");
    if context.is_empty() {
        prompt.push_str(empty_note);
        prompt.push_str("\n\n");
        return;
    }

    for file in context.iter().take(limit) {
        prompt.push_str(&format!("### File: {}\n", file.path));
        if !file.package_name.is_empty() {
            prompt.push_str(&format!("Package: {}\n", file.package_name));
        }
        push_code_block(prompt, "kotlin", &file.content);
    }
}

/// Split `a.b.Foo` into (`a.b`, `Foo`)
fn split_qualified_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) => (&name[..dot], &name[dot + 1..]),
        None => ("", name),
    }
}

/// Package the instrumentation and BDD prompts ask the model to use
pub fn base_package(request: &GenerationRequest) -> String {
    if let Some((package, _)) = request.target_class_name().map(split_qualified_name) {
        if !package.is_empty() {
            return package.to_string();
        }
    }
    request
        .project_context()
        .iter()
        .map(|file| file.package_name.as_str())
        .find(|package| !package.is_empty())
        .unwrap_or(FALLBACK_BASE_PACKAGE)
        .to_string()
}

/// Prompt for JVM unit tests of one class
pub fn build_unit_prompt(request: &GenerationRequest, config: &GenerationConfig) -> String {
    let mut prompt = String::new();

    prompt.push_str("[TASK]\n");
    prompt.push_str("You are an expert Kotlin developer tasked with generating unit tests.\n\n");

    prompt.push_str("[REQUIREMENTS]\n");
    prompt.push_str(&format!(
        "- Use {} for test structure\n",
        config.test_framework.display_name()
    ));
    prompt.push_str(&format!(
        "- Use {} for mocking\n",
        config.mocking_library.display_name()
    ));
    prompt.push_str(templates::guidance_for(TestScope::Unit, false));
    prompt.push_str("\n\n");

    push_existing_tests(&mut prompt, request);

    prompt.push_str("[TARGET CLASS]\n");
    if let Some(target) = request.target_class_name() {
        let (package, class) = split_qualified_name(target);
        prompt.push_str(&format!("Package: {}\n", package));
        prompt.push_str(&format!("Class Name: {}\n", class));
    }
    if let Some(path) = request.target_file_path() {
        prompt.push_str(&format!("File: {}\n", path));
    }
    push_code_block(&mut prompt, "kotlin", request.source_code().unwrap_or_default());

    push_single_file_format(&mut prompt, "Kotlin test class");
    prompt
}

/// Prompt for one Jetpack Compose instrumentation test class
pub fn build_instrumentation_prompt(
    request: &GenerationRequest,
    config: &GenerationConfig,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("[TASK]\n");
    prompt.push_str(
        "You are an expert Android developer tasked with generating Jetpack Compose instrumentation tests.\n\n",
    );

    prompt.push_str("[REQUIREMENTS]\n");
    prompt.push_str(&format!(
        "- Use {} for test structure\n",
        config.test_framework.display_name()
    ));
    prompt.push_str(&format!("- Package: {}\n", base_package(request)));
    if let Some(target) = request.target_class_name() {
        prompt.push_str(&format!("- Class name: {}\n", split_qualified_name(target).1));
    }
    prompt.push_str(templates::guidance_for(TestScope::Instrumentation, false));
    prompt.push_str("\n\n");

    push_existing_tests(&mut prompt, request);
    push_project_context(
        &mut prompt,
        request.project_context(),
        config.max_context_files,
        "No project files analyzed; generate a basic instrumentation test template.",
    );

    prompt.push_str("[INSTRUCTIONS]\n");
    prompt.push_str("Based on the project context above, generate Compose instrumentation tests that:\n");
    prompt.push_str("1. Test Composable components from the project\n");
    prompt.push_str("2. Include a package declaration matching the project\n");
    prompt.push_str("3. Import the Compose UI test libraries (androidx.compose.ui.test.*)\n");
    prompt.push_str("4. Use ComposeTestRule and semantic-based testing\n");
    prompt.push_str("5. Include navigation and interaction tests\n\n");

    push_single_file_format(&mut prompt, "Kotlin instrumentation test class");
    prompt
}

/// Prompt for the Cucumber feature/steps/runner triple
pub fn build_bdd_prompt(request: &GenerationRequest, config: &GenerationConfig) -> String {
    let base = base_package(request);
    let mut prompt = String::new();

    prompt.push_str("[TASK]\n");
    prompt.push_str(
        "You are an expert Android BDD test developer tasked with generating Cucumber BDD tests using Jetpack Compose testing.\n\n",
    );

    prompt.push_str("[REQUIREMENTS]\n");
    prompt.push_str("Generate THREE separate files:\n");
    prompt.push_str("1. A Gherkin .feature file with test scenarios\n");
    prompt.push_str(&format!("2. A Kotlin step definitions file in package {}\n", base));
    prompt.push_str(&format!(
        "3. A Kotlin test runner class named {} in package {}\n\n",
        DEFAULT_RUNNER_CLASS_NAME, base
    ));
    prompt.push_str(templates::guidance_for(TestScope::Instrumentation, true));
    prompt.push_str("\n\n");

    push_existing_tests(&mut prompt, request);
    push_project_context(
        &mut prompt,
        request.project_context(),
        config.max_context_files,
        "No project files analyzed; generate a basic BDD test template.",
    );

    prompt.push_str("[RUNNER EXAMPLE]\n");
    push_code_block(
        &mut prompt,
        "kotlin",
        &format!(
            "package {base}\n\nimport io.cucumber.android.runner.CucumberAndroidJUnitRunner\nimport io.cucumber.junit.CucumberOptions\nimport org.junit.runner.RunWith\n\n@RunWith(CucumberAndroidJUnitRunner::class)\n@CucumberOptions(\n    features = [\"features\"],\n    glue = [\"{base}\"]\n)\nclass {runner}",
            base = base,
            runner = DEFAULT_RUNNER_CLASS_NAME
        ),
    );

    prompt.push_str("[OUTPUT FORMAT]\n");
    prompt.push_str("Generate ALL THREE files, each wrapped in its markers exactly as shown:\n\n");
    push_marker_region(
        &mut prompt,
        &FEATURE_FILE_MARKERS,
        "[complete .feature file with proper Gherkin syntax]",
    );
    push_marker_region(
        &mut prompt,
        &STEP_DEFINITIONS_MARKERS,
        "[complete Kotlin step definitions file]",
    );
    push_marker_region(
        &mut prompt,
        &TEST_RUNNER_MARKERS,
        "[complete Kotlin test runner class]",
    );
    prompt
}

fn push_single_file_format(prompt: &mut String, what: &str) {
    prompt.push_str("[OUTPUT FORMAT]\n");
    prompt.push_str(&format!(
        "Return ONLY the complete {} between these markers, with no explanations:\n\n",
        what
    ));
    push_marker_region(prompt, &TEST_FILE_MARKERS, "[complete test file]");
}

/// Prompt for one refinement round over already generated test code
pub fn build_refine_prompt(context: &RefineContext, user_message: &str) -> String {
    let test_type = context.scope.display_name();
    let mut prompt = String::new();

    prompt.push_str("[TASK]\n");
    prompt.push_str(&format!(
        "You are an AI assistant helping to refine and improve {} code.\n\n",
        test_type
    ));

    prompt.push_str("[CONTEXT]\n");
    prompt.push_str(&format!("- Test Type: {}\n", test_type));
    prompt.push_str(&format!("- Package: {}\n", context.package_name));
    if let Some(target) = &context.target_class_name {
        prompt.push_str(&format!("- Target Class: {}\n", target));
    }
    prompt.push('\n');

    prompt.push_str("[CURRENT TEST CODE]\n");
    push_code_block(&mut prompt, "kotlin", &context.current_code);

    if !context.messages.is_empty() {
        prompt.push_str("[CONVERSATION HISTORY]\n");
        prompt.push_str(&context.conversation_history());
        prompt.push_str("\n\n");
    }

    prompt.push_str("[USER REQUEST]\n");
    prompt.push_str(user_message);
    prompt.push_str("\n\n");

    prompt.push_str("[INSTRUCTIONS]\n");
    prompt.push_str(templates::get_templates().refine_guidance);
    prompt.push_str("\n\n");

    prompt.push_str("[OUTPUT FORMAT]\n");
    push_marker_region(&mut prompt, &CODE_MARKERS, "[modified test code]");
    push_marker_region(
        &mut prompt,
        &EXPLANATION_MARKERS,
        "[brief explanation of the changes made]",
    );
    prompt
}

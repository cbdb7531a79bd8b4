//! System prompts for the different request kinds
//!
//! These set the model's behavior at the system level. Request details
//! (source, existing tests, markers) travel in the user message built by the
//! parser's prompt builder.

use crate::models::TestScope;

/// System prompt for single-file test generation
pub const SYSTEM_PROMPT_GENERATE: &str = r#"You are a test generation agent for Android projects. Read the prompt once, then output code immediately.
Output ONLY the complete Kotlin test file between the requested markers.
Never repeat a test method the prompt lists as existing.
Be concise. No explanations unless requested."#;

/// System prompt for the Cucumber three-file protocol
pub const SYSTEM_PROMPT_BDD: &str = r#"You are a BDD test generation agent for Android projects.
Output exactly three files: the feature file, the step definitions and the test runner.
Wrap each file in its START/END markers exactly as the prompt shows; never omit a section.
Be concise. No explanations outside the markers."#;

/// System prompt for refinement rounds
pub const SYSTEM_PROMPT_REFINE: &str = r#"You are a test refinement agent. Apply the user's request to the current test code.
Return the full modified file between the CODE markers and a brief explanation between the EXPLANATION markers.
Keep every existing test unless the user asks to remove it."#;

/// System prompt for a generation request
pub fn system_prompt_for(scope: TestScope, bdd: bool) -> &'static str {
    match (scope, bdd) {
        (TestScope::Instrumentation, true) => SYSTEM_PROMPT_BDD,
        _ => SYSTEM_PROMPT_GENERATE,
    }
}

//! Bundled prompt guidance and project initialization templates
//!
//! The prompt builder splices these fixed passages into every prompt; `init`
//! writes the default configuration file.

pub mod android;

use crate::models::TestScope;

/// Template content for Android test generation
pub struct Templates {
    /// Requirements block for JVM unit tests
    pub unit_guidance: &'static str,
    /// Jetpack Compose testing guidance for instrumentation tests
    pub compose_guidance: &'static str,
    /// Compose guidance and file guidelines for the Cucumber triple
    pub bdd_guidance: &'static str,
    /// Instructions for a refinement round
    pub refine_guidance: &'static str,
    /// Default configuration content
    pub config: &'static str,
}

/// Get the bundled templates
pub fn get_templates() -> Templates {
    android::templates()
}

/// Guidance block for a scope, picking the BDD text when requested
pub fn guidance_for(scope: TestScope, bdd: bool) -> &'static str {
    let templates = get_templates();
    match (scope, bdd) {
        (TestScope::Unit, _) => templates.unit_guidance,
        (TestScope::Instrumentation, false) => templates.compose_guidance,
        (TestScope::Instrumentation, true) => templates.bdd_guidance,
    }
}

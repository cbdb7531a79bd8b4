//! Artifact extraction from raw model replies.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::scan::{scan_class_name, scan_package_name, scan_test_method_names};
use super::{
    SectionMarkers, CODE_MARKERS, EXPLANATION_MARKERS, FEATURE_FILE_MARKERS, STEP_DEFINITIONS_MARKERS,
    TEST_FILE_MARKERS, TEST_RUNNER_MARKERS,
};
use crate::error::ExtractionError;
use crate::models::{
    BddTriple, ExtractedArtifact, ExtractionMode, RawModelReply, Refinement, SingleFileArtifact,
    DEFAULT_CLASS_NAME, DEFAULT_RUNNER_CLASS_NAME,
};

/// Explanation used when a refinement reply carries none
pub const DEFAULT_REFINE_EXPLANATION: &str = "Code updated based on your request.";

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[\w+-]*[ \t]*\n(.*?)\n?```").expect("fenced block pattern"));

/// Strip a leading and trailing triple-backtick fence
///
/// The opening fence may carry a language tag (```kotlin, ```gherkin).
/// Text without fences comes back trimmed and otherwise unchanged.
pub fn strip_code_fences(content: &str) -> String {
    let mut text = content.trim();

    if let Some(rest) = text.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '+' || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        let after_tag = &rest[tag_len..];
        text = match after_tag.find('\n') {
            Some(nl) if after_tag[..nl].trim().is_empty() => &after_tag[nl + 1..],
            _ => after_tag,
        };
        debug!("Stripped opening code fence");
    }

    let trimmed = text.trim_end();
    if let Some(rest) = trimmed.strip_suffix("```") {
        debug!("Stripped closing code fence");
        text = rest;
    }

    text.trim().to_string()
}

/// Inner text of a marker region, trimmed and fence-stripped
pub fn extract_section(reply: &str, markers: &SectionMarkers) -> Option<String> {
    let start = reply.find(markers.start)? + markers.start.len();
    let end = start + reply[start..].find(markers.end)?;
    Some(strip_code_fences(&reply[start..end]))
}

/// Candidate body of a single-file reply
///
/// Preference order: the TEST FILE marker region, a reply that is itself one
/// fenced block, the longest fenced block embedded in prose, the raw text.
fn single_file_body(reply: &str) -> String {
    if let Some(section) = extract_section(reply, &TEST_FILE_MARKERS) {
        debug!("Extracted test file from marker region");
        return section;
    }

    let trimmed = reply.trim();
    if trimmed.starts_with("```") {
        return strip_code_fences(trimmed);
    }

    let longest = FENCED_BLOCK_RE
        .captures_iter(trimmed)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|block| !block.is_empty())
        .max_by_key(|block| block.len());

    match longest {
        Some(block) => {
            debug!("Extracted longest fenced block from prose reply");
            block.to_string()
        }
        None => {
            debug!("No code fences found, using raw response");
            trimmed.to_string()
        }
    }
}

/// Extract one test source file; never fails
pub fn extract_single_file(reply: &RawModelReply) -> SingleFileArtifact {
    let code = single_file_body(reply.as_str());

    let package_name = scan_package_name(&code).unwrap_or_default();
    let class_name = scan_class_name(&code).unwrap_or_else(|| DEFAULT_CLASS_NAME.to_string());
    let new_test_method_names = scan_test_method_names(&code);

    debug!(
        "Extracted single file: package='{}', class='{}', {} test methods",
        package_name,
        class_name,
        new_test_method_names.len()
    );

    SingleFileArtifact {
        code,
        package_name,
        class_name,
        new_test_method_names,
    }
}

fn required_section(reply: &str, markers: &SectionMarkers) -> Result<String, ExtractionError> {
    extract_section(reply, markers).ok_or_else(|| ExtractionError::MissingSection {
        section: markers.name.to_string(),
        start_marker: markers.start.to_string(),
        end_marker: markers.end.to_string(),
        reply_excerpt: reply.trim().chars().take(200).collect(),
    })
}

/// Extract the feature/steps/runner triple
///
/// Every one of the three marker regions is required; a reply missing any of
/// them is rejected rather than returned partially.
pub fn extract_bdd(reply: &RawModelReply) -> Result<BddTriple, ExtractionError> {
    let text = reply.as_str();
    let feature_file = required_section(text, &FEATURE_FILE_MARKERS)?;
    let step_definitions = required_section(text, &STEP_DEFINITIONS_MARKERS)?;
    let test_runner = required_section(text, &TEST_RUNNER_MARKERS)?;

    let package_name = scan_package_name(&step_definitions).unwrap_or_default();
    let class_name =
        scan_class_name(&step_definitions).unwrap_or_else(|| DEFAULT_CLASS_NAME.to_string());
    let runner_class_name =
        scan_class_name(&test_runner).unwrap_or_else(|| DEFAULT_RUNNER_CLASS_NAME.to_string());

    debug!(
        "Extracted BDD triple: package='{}', steps='{}', runner='{}'",
        package_name, class_name, runner_class_name
    );

    Ok(BddTriple {
        feature_file,
        step_definitions,
        test_runner,
        package_name,
        class_name,
        runner_class_name,
    })
}

/// Extract the artifact the given protocol calls for
pub fn extract_artifact(
    reply: &RawModelReply,
    mode: ExtractionMode,
) -> Result<ExtractedArtifact, ExtractionError> {
    match mode {
        ExtractionMode::SingleFile => Ok(ExtractedArtifact::SingleFile(extract_single_file(reply))),
        ExtractionMode::Bdd => extract_bdd(reply).map(ExtractedArtifact::Bdd),
    }
}

/// Parse a refinement reply into code and explanation
pub fn extract_refinement(reply: &RawModelReply) -> Refinement {
    let text = reply.as_str();
    let code = extract_section(text, &CODE_MARKERS).unwrap_or_else(|| {
        debug!("Refinement reply had no code markers, using whole reply");
        strip_code_fences(text)
    });
    let explanation = extract_section(text, &EXPLANATION_MARKERS)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_REFINE_EXPLANATION.to_string());

    Refinement { code, explanation }
}

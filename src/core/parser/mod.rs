//! Parser module: prompt assembly, reply extraction and test merging.

mod extract;
mod merge;
mod prompts;
mod scan;

pub use extract::*;
pub use merge::*;
pub use prompts::*;
pub use scan::*;

/// A start/end marker pair delimiting one region of a model reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionMarkers {
    /// Human-readable section name used in errors
    pub name: &'static str,
    pub start: &'static str,
    pub end: &'static str,
}

pub const FEATURE_FILE_MARKERS: SectionMarkers = SectionMarkers {
    name: "FEATURE FILE",
    start: "=== FEATURE FILE START ===",
    end: "=== FEATURE FILE END ===",
};

pub const STEP_DEFINITIONS_MARKERS: SectionMarkers = SectionMarkers {
    name: "STEP DEFINITIONS",
    start: "=== STEP DEFINITIONS START ===",
    end: "=== STEP DEFINITIONS END ===",
};

pub const TEST_RUNNER_MARKERS: SectionMarkers = SectionMarkers {
    name: "TEST RUNNER",
    start: "=== TEST RUNNER START ===",
    end: "=== TEST RUNNER END ===",
};

/// Optional wrapper around a single generated test file
pub const TEST_FILE_MARKERS: SectionMarkers = SectionMarkers {
    name: "TEST FILE",
    start: "=== TEST FILE START ===",
    end: "=== TEST FILE END ===",
};

pub const CODE_MARKERS: SectionMarkers = SectionMarkers {
    name: "CODE",
    start: "=== CODE START ===",
    end: "=== CODE END ===",
};

pub const EXPLANATION_MARKERS: SectionMarkers = SectionMarkers {
    name: "EXPLANATION",
    start: "=== EXPLANATION START ===",
    end: "=== EXPLANATION END ===",
};

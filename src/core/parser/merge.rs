//! Splicing generated test methods into an existing test file.

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use super::scan::{
    find_last_top_level_close, find_test_method_block, line_indent_at, scan_test_method_names,
};
use crate::models::{MergeDecision, MergeResult};

const DEFAULT_MEMBER_INDENT: &str = "    ";

/// Header line placed above every appended batch of methods
pub fn generated_section_header(indent: &str, timestamp: &DateTime<Local>) -> String {
    format!(
        "{}// ========== AI Generated Tests ({}) ==========",
        indent,
        timestamp.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Merge a candidate test file into the existing one
///
/// See [`merge_test_code_at`]; this variant stamps the header with the
/// current local time.
pub fn merge_test_code(
    decision: MergeDecision,
    existing: Option<&str>,
    candidate: &str,
    new_methods: &[String],
) -> MergeResult {
    merge_test_code_at(decision, existing, candidate, new_methods, &Local::now())
}

/// Merge a candidate test file into the existing one
///
/// With `CreateNew`, or without an existing file, the candidate is returned
/// unchanged. With `AppendToExisting`, each named method that the existing
/// file does not already declare is cut from the candidate and inserted
/// before the existing file's last top-level `}` under a timestamped header.
/// When the existing file has no such brace the candidate wins and
/// `fell_back` is set.
pub fn merge_test_code_at(
    decision: MergeDecision,
    existing: Option<&str>,
    candidate: &str,
    new_methods: &[String],
    timestamp: &DateTime<Local>,
) -> MergeResult {
    let existing = match (decision, existing) {
        (MergeDecision::AppendToExisting, Some(existing)) => existing,
        _ => {
            return MergeResult {
                text: candidate.to_string(),
                inserted_count: scan_test_method_names(candidate).len(),
                fell_back: false,
            }
        }
    };

    let Some(close) = find_last_top_level_close(existing) else {
        warn!("Existing test file has no closing brace; replacing it with the generated file");
        return MergeResult {
            text: candidate.to_string(),
            inserted_count: scan_test_method_names(candidate).len(),
            fell_back: true,
        };
    };

    let already_present = scan_test_method_names(existing);
    let mut blocks: Vec<&str> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for name in new_methods {
        if already_present.iter().any(|n| n == name) || seen.contains(&name.as_str()) {
            debug!("Skipping '{}': already present", name);
            continue;
        }
        match find_test_method_block(candidate, name) {
            Some(block) => {
                blocks.push(block);
                seen.push(name);
            }
            None => warn!("Could not locate body of generated test '{}'; skipping", name),
        }
    }

    if blocks.is_empty() {
        debug!("No new test methods to append");
        return MergeResult {
            text: existing.to_string(),
            inserted_count: 0,
            fell_back: false,
        };
    }

    let indent = member_indent(existing);
    let mut text = String::with_capacity(existing.len() + candidate.len());
    let (head, tail) = existing.split_at(close);
    text.push_str(head);
    if !head.ends_with('\n') {
        text.push('\n');
    }
    text.push('\n');
    text.push_str(&generated_section_header(&indent, timestamp));
    text.push('\n');

    for block in &blocks {
        text.push('\n');
        text.push_str(&reindent_block(candidate, block, &indent));
        text.push('\n');
    }

    text.push_str(tail);

    debug!("Appended {} test methods to existing file", blocks.len());
    MergeResult {
        text,
        inserted_count: blocks.len(),
        fell_back: false,
    }
}

/// Indentation of the first indented code line of a file
fn member_indent(code: &str) -> String {
    code.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let trimmed = line.trim_start_matches(|c: char| c == ' ' || c == '\t');
            &line[..line.len() - trimmed.len()]
        })
        .find(|indent| !indent.is_empty())
        .unwrap_or(DEFAULT_MEMBER_INDENT)
        .to_string()
}

/// Re-indent a method block cut from `source` so it sits at `indent`
fn reindent_block(source: &str, block: &str, indent: &str) -> String {
    let block_start = block.as_ptr() as usize - source.as_ptr() as usize;
    let base = line_indent_at(source, block_start);

    block
        .lines()
        .enumerate()
        .map(|(i, line)| {
            if line.trim().is_empty() {
                String::new()
            } else if i == 0 {
                format!("{}{}", indent, line.trim_start())
            } else {
                format!("{}{}", indent, line.strip_prefix(base).unwrap_or(line.trim_start()))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_append_scenario() {
        let existing = "class A {\n  @Test fun a() {}\n}";
        let candidate = "class A {\n  @Test fun b() { x() }\n}";
        let result = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some(existing),
            candidate,
            &names(&["b"]),
            &fixed_time(),
        );

        assert_eq!(
            result.text,
            "class A {\n  @Test fun a() {}\n\n  // ========== AI Generated Tests (2024-05-17 09:30:00) ==========\n\n  @Test fun b() { x() }\n}"
        );
        assert_eq!(result.inserted_count, 1);
        assert!(!result.fell_back);
    }

    #[test]
    fn test_existing_prefix_preserved() {
        let existing = "package p\n\nclass A {\n    @Test\n    fun a() {\n        check(1)\n    }\n}\n";
        let candidate = "package p\n\nclass A {\n    @Test\n    fun b() {\n        if (x) { y() }\n    }\n\n    @Test\n    fun c() = runTest {\n        z()\n    }\n}\n";
        let result = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some(existing),
            candidate,
            &names(&["b", "c"]),
            &fixed_time(),
        );

        let close = existing.rfind('}').unwrap();
        assert!(result.text.starts_with(&existing[..close]));
        assert!(result.text.ends_with("}\n"));
        assert!(result.text.contains("    @Test\n    fun b() {\n        if (x) { y() }\n    }"));
        assert!(result.text.contains("    fun c() = runTest {\n        z()\n    }"));
        assert_eq!(result.inserted_count, 2);
        assert_eq!(scan_test_method_names(&result.text), names(&["a", "b", "c"]));
    }

    #[test]
    fn test_no_closer_falls_back_to_candidate() {
        let candidate = "class A {\n  @Test fun b() {}\n}";
        let result = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some("// truncated file without braces"),
            candidate,
            &names(&["b"]),
            &fixed_time(),
        );
        assert_eq!(result.text, candidate);
        assert!(result.fell_back);
        assert_eq!(result.inserted_count, 1);
    }

    #[test]
    fn test_create_new_returns_candidate() {
        let candidate = "class A {\n  @Test fun a() {}\n  @Test fun b() {}\n}";
        let result = merge_test_code_at(
            MergeDecision::CreateNew,
            Some("class Old {}"),
            candidate,
            &names(&["a", "b"]),
            &fixed_time(),
        );
        assert_eq!(result.text, candidate);
        assert_eq!(result.inserted_count, 2);
        assert!(!result.fell_back);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = "class A {\n  @Test fun a() {}\n}";
        let candidate = "class A {\n  @Test fun b() {}\n}";
        let once = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some(existing),
            candidate,
            &names(&["b"]),
            &fixed_time(),
        );
        let twice = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some(&once.text),
            candidate,
            &names(&["b"]),
            &fixed_time(),
        );
        assert_eq!(twice.text, once.text);
        assert_eq!(twice.inserted_count, 0);
    }

    #[test]
    fn test_brace_inside_string_does_not_confuse_merge() {
        let existing = "class A {\n    @Test fun a() { assertEquals(\"}\", s) }\n}\n";
        let candidate = "class A {\n    @Test fun b() { val t = \"{ not a block\" }\n}\n";
        let result = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some(existing),
            candidate,
            &names(&["b"]),
            &fixed_time(),
        );
        assert!(result.text.contains("    @Test fun b() { val t = \"{ not a block\" }\n}\n"));
        assert_eq!(result.inserted_count, 1);
    }

    #[test]
    fn test_unknown_method_is_skipped() {
        let existing = "class A {\n  @Test fun a() {}\n}";
        let result = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some(existing),
            "class A {}",
            &names(&["ghost"]),
            &fixed_time(),
        );
        assert_eq!(result.text, existing);
        assert_eq!(result.inserted_count, 0);
    }

    #[test]
    fn test_expression_body_test_does_not_copy_companion() {
        let existing = "class A {\n    @Test fun a() {}\n\n    companion object {\n        const val X = 1\n    }\n}\n";
        let candidate = "class A {\n    @Test fun b() = assertEquals(1, one())\n\n    companion object {\n        const val X = 1\n    }\n}";
        let result = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some(existing),
            candidate,
            &names(&["b"]),
            &fixed_time(),
        );
        assert_eq!(result.inserted_count, 1);
        assert_eq!(result.text.matches("companion object").count(), 1);
        assert!(result.text.contains("    @Test fun b() = assertEquals(1, one())\n"));
        assert!(result.text.ends_with("}\n"));
    }

    #[test]
    fn test_commented_out_copy_does_not_hide_real_method() {
        let existing = "class A {\n    @Test fun a() {}\n}";
        let candidate = "class A {\n    // @Test fun b() was flaky\n    @Test\n    fun b() {\n        x()\n    }\n}";
        let result = merge_test_code_at(
            MergeDecision::AppendToExisting,
            Some(existing),
            candidate,
            &names(&["b"]),
            &fixed_time(),
        );
        assert_eq!(result.inserted_count, 1);
        assert!(result.text.contains("    @Test\n    fun b() {\n        x()\n    }"));
        assert!(!result.text.contains("was flaky"));
    }

    #[test]
    fn test_member_indent() {
        assert_eq!(member_indent("class A {\n\tfun x() {}\n}"), "\t");
        assert_eq!(member_indent("class A {}"), DEFAULT_MEMBER_INDENT);
    }
}

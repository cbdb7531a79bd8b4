use std::path::Path;
use tracing::info;

use crate::core::{extract_single_file, merge_test_code, scan_test_method_names, FileStore};
use crate::error::AiTestGenError;
use crate::models::{MergeDecision, MergeResult, RawModelReply};

/// Merge a candidate test file (or raw model reply) into an existing test file
///
/// Pure text operation over the two inputs; nothing is generated.
pub fn merge_text(existing: Option<&str>, candidate_reply: &str) -> MergeResult {
    let artifact = extract_single_file(&RawModelReply::new(candidate_reply));
    let present = existing.map(scan_test_method_names).unwrap_or_default();

    let mut new_methods: Vec<String> = Vec::new();
    for name in artifact.new_test_method_names {
        if !present.contains(&name) && !new_methods.contains(&name) {
            new_methods.push(name);
        }
    }

    let decision = MergeDecision::choose(existing, &new_methods);
    match (existing, decision) {
        (Some(existing), MergeDecision::CreateNew) => MergeResult {
            text: existing.to_string(),
            inserted_count: 0,
            fell_back: false,
        },
        _ => merge_test_code(decision, existing, &artifact.code, &new_methods),
    }
}

/// Offline merge of two files; prints the result or writes it to `output`
pub fn merge_files(
    store: &dyn FileStore,
    existing: &Path,
    candidate: &Path,
    output: Option<&Path>,
) -> Result<(), AiTestGenError> {
    let existing_text = store.read(existing)?;
    let candidate_text = store.read(candidate)?.ok_or_else(|| {
        AiTestGenError::Input(format!("Candidate file not found: {}", candidate.display()))
    })?;

    let result = merge_text(existing_text.as_deref(), &candidate_text);
    info!(
        "Merged {} new test method(s) from {}",
        result.inserted_count,
        candidate.display()
    );

    match output {
        Some(path) => {
            store.write(path, &result.text)?;
            println!(
                "Wrote {} ({} new test method(s))",
                path.display(),
                result.inserted_count
            );
        }
        None => print!("{}", result.text),
    }

    if result.fell_back {
        eprintln!(
            "Warning: {} has no closing brace; the candidate replaced it instead of being appended",
            existing.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FsFileStore, MemoryFileStore};
    use tempfile::TempDir;

    #[test]
    fn test_merge_text_appends_only_new_methods() {
        let existing = "class FooTest {\n  @Test fun a() {}\n}";
        let reply = "```kotlin\nclass FooTest {\n  @Test fun a() {}\n  @Test fun b() { x() }\n}\n```";
        let result = merge_text(Some(existing), reply);
        assert_eq!(result.inserted_count, 1);
        assert!(result.text.contains("fun a()"));
        assert!(result.text.contains("@Test fun b() { x() }"));
    }

    #[test]
    fn test_merge_text_nothing_new_keeps_existing() {
        let existing = "class FooTest {\n  @Test fun a() {}\n}";
        let result = merge_text(Some(existing), existing);
        assert_eq!(result.text, existing);
        assert_eq!(result.inserted_count, 0);
    }

    #[test]
    fn test_merge_files_writes_output() {
        let store = MemoryFileStore::new()
            .with_file("FooTest.kt", "class FooTest {\n    @Test fun a() {}\n}\n")
            .with_file("reply.txt", "class FooTest {\n    @Test fun b() {}\n}\n");

        merge_files(
            &store,
            Path::new("FooTest.kt"),
            Path::new("reply.txt"),
            Some(Path::new("out.kt")),
        )
        .unwrap();
        let merged = store.read(Path::new("out.kt")).unwrap().unwrap();
        assert_eq!(scan_test_method_names(&merged), vec!["a", "b"]);
        assert!(merged.ends_with("}\n"));
    }

    #[test]
    fn test_merge_files_missing_existing_takes_candidate() {
        let store = MemoryFileStore::new().with_file("reply.txt", "```kotlin\nclass FooTest {\n    @Test fun b() {}\n}\n```");

        merge_files(
            &store,
            Path::new("FooTest.kt"),
            Path::new("reply.txt"),
            Some(Path::new("FooTest.kt")),
        )
        .unwrap();
        assert_eq!(
            store.read(Path::new("FooTest.kt")).unwrap().as_deref(),
            Some("class FooTest {\n    @Test fun b() {}\n}")
        );
    }

    #[test]
    fn test_merge_files_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("FooTest.kt"), "class FooTest {\n    @Test fun a() {}\n}\n").unwrap();
        std::fs::write(temp_dir.path().join("reply.txt"), "class FooTest {\n    @Test fun c() {}\n}\n").unwrap();
        let store = FsFileStore::new(temp_dir.path());

        merge_files(&store, Path::new("FooTest.kt"), Path::new("reply.txt"), Some(Path::new("FooTest.kt"))).unwrap();
        let merged = std::fs::read_to_string(temp_dir.path().join("FooTest.kt")).unwrap();
        assert_eq!(scan_test_method_names(&merged), vec!["a", "c"]);
    }

    #[test]
    fn test_merge_files_missing_candidate() {
        let store = MemoryFileStore::new();
        let err = merge_files(&store, Path::new("a.kt"), Path::new("missing.kt"), None).unwrap_err();
        assert!(matches!(err, AiTestGenError::Input(_)));
    }
}

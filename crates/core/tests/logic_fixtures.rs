//! Runs the logic validator over every artifact in fixtures/.
//!
//! `fixtures/positive/*.json` must validate cleanly. Each
//! `fixtures/negative/<name>.json` must produce exactly the issues listed in
//! `<name>.expected.json` (code, path, and variable when present).

use formlogic_core::{
    topological_sort_logic_keys, validate_logic, validate_logic_value, Artifact, LogicReport,
    ValidateOptions, ValidationIssue,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fixtures")
}

fn load_json(path: &Path) -> Value {
    let src = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&src).unwrap_or_else(|e| panic!("Invalid JSON in {}: {}", path.display(), e))
}

fn artifact_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to list {}: {}", dir.display(), e))
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().is_some_and(|e| e == "json")
                && !p.to_string_lossy().ends_with(".expected.json")
        })
        .collect();
    paths.sort();
    paths
}

/// The comparable part of an issue; messages are checked by unit tests.
fn summarize(issue: &ValidationIssue) -> Value {
    let mut v = json!({ "code": issue.code, "path": issue.path });
    if let Some(var) = &issue.variable {
        v["variable"] = json!(var);
    }
    v
}

#[test]
fn positive_fixtures_validate_cleanly() {
    let files = artifact_files(&fixtures_root().join("positive"));
    assert!(!files.is_empty(), "No positive fixtures found -- check paths");

    let mut failures = Vec::new();
    for path in &files {
        let value = load_json(path);
        match validate_logic_value(&value, &ValidateOptions::default()) {
            Ok(LogicReport::Value(v)) => assert_eq!(v, value),
            Ok(LogicReport::Issues(issues)) => {
                for issue in issues {
                    failures.push(format!("{}: {}", path.display(), issue));
                }
            }
            Err(e) => failures.push(format!("{}: {}", path.display(), e)),
        }
    }
    assert!(failures.is_empty(), "Unexpected issues:\n{}", failures.join("\n"));
}

#[test]
fn negative_fixtures_report_expected_issues() {
    let files = artifact_files(&fixtures_root().join("negative"));
    assert!(!files.is_empty(), "No negative fixtures found -- check paths");

    for path in &files {
        let expected_path = path.with_extension("expected.json");
        let expected = load_json(&expected_path);
        let artifact = Artifact::from_json(&load_json(path))
            .unwrap_or_else(|e| panic!("{}: {}", path.display(), e));

        let issues = validate_logic(&artifact, &ValidateOptions::default())
            .err()
            .unwrap_or_default();
        let actual = Value::Array(issues.iter().map(summarize).collect());
        assert_eq!(actual, expected, "issue mismatch for {}", path.display());
    }
}

#[test]
fn every_issue_carries_expression_except_cycles() {
    for path in artifact_files(&fixtures_root().join("negative")) {
        let artifact = Artifact::from_json(&load_json(&path)).unwrap();
        let issues = validate_logic(&artifact, &ValidateOptions::default()).unwrap_err();
        for issue in issues {
            let is_cycle = issue.code == formlogic_core::IssueCode::CircularDependency;
            assert_eq!(
                issue.expression.is_none(),
                is_cycle,
                "{}: {}",
                path.display(),
                issue
            );
        }
    }
}

#[test]
fn first_error_mode_returns_a_prefix() {
    let options = ValidateOptions {
        collect_all_errors: false,
        ..ValidateOptions::default()
    };
    for path in artifact_files(&fixtures_root().join("negative")) {
        let artifact = Artifact::from_json(&load_json(&path)).unwrap();
        let all = validate_logic(&artifact, &ValidateOptions::default()).unwrap_err();
        let first = validate_logic(&artifact, &options).unwrap_err();
        assert_eq!(first.len(), 1, "{}", path.display());
        assert_eq!(first[0], all[0], "{}", path.display());
    }
}

#[test]
fn diamond_fixture_orders_dependencies_first() {
    let value = load_json(&fixtures_root().join("positive/diamond.json"));
    let artifact = Artifact::from_json(&value).unwrap();
    let logic = artifact.logic().expect("forms have a logic section");
    let order = topological_sort_logic_keys(logic);
    let pos = |k: &str| order.sorted.iter().position(|s| s == k).unwrap();

    assert!(order.cyclic_keys.is_empty());
    assert_eq!(order.sorted.len(), 5);
    assert!(pos("isAdult") < pos("canVote"));
    assert!(pos("isAdult") < pos("canDrive"));
    assert!(pos("hasLicense") < pos("canDrive"));
    assert!(pos("canVote") < pos("canDoEverything"));
    assert!(pos("canDrive") < pos("canDoEverything"));
}

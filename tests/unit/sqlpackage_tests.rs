//! Unit tests for file path resolution

use std::fs;

use tempfile::TempDir;

use rust_sqldeploy::error::DeployError;
use rust_sqldeploy::sqlpackage::resolve_file_path;

#[test]
fn test_literal_path_is_absolutized() {
    let resolved = resolve_file_path("migrate.sql").unwrap();

    assert!(resolved.is_absolute());
    assert!(resolved.ends_with("migrate.sql"));
}

#[test]
fn test_literal_path_needs_no_existing_file() {
    // Existence is checked by whoever reads the file, not here
    assert!(resolve_file_path("does/not/exist.sql").is_ok());
}

#[test]
fn test_glob_pattern_with_single_match_resolves() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("deploy.sql"), "SELECT 1").unwrap();

    let pattern = format!("{}/*.sql", dir.path().display());
    let resolved = resolve_file_path(&pattern).unwrap();

    assert!(resolved.is_absolute());
    assert!(resolved.ends_with("deploy.sql"));
}

#[test]
fn test_glob_pattern_with_no_match_fails() {
    let dir = TempDir::new().unwrap();

    let pattern = format!("{}/*.sql", dir.path().display());
    let err = resolve_file_path(&pattern).unwrap_err();

    assert!(matches!(err, DeployError::FileResolution { .. }));
}

#[test]
fn test_glob_pattern_with_multiple_matches_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.sql"), "SELECT 1").unwrap();
    fs::write(dir.path().join("b.sql"), "SELECT 2").unwrap();

    let pattern = format!("{}/*.sql", dir.path().display());
    let err = resolve_file_path(&pattern).unwrap_err();

    match err {
        DeployError::FileResolution { message, .. } => {
            assert!(message.contains("expected exactly one"));
        }
        other => panic!("Expected FileResolution, got {:?}", other),
    }
}

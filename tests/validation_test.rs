//! Tests for upload, search-term and configuration input validation

use std::fs;
use std::path::Path;

use tempfile::tempdir;
use vendor_compliance::validation::{InputValidator, MAX_SKIP_ROWS};

#[test]
fn test_validate_upload_path_valid_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vendors.csv");
    fs::write(&path, "1,Acme Corp\n").unwrap();
    assert!(InputValidator::validate_upload_path(&path, 25).is_ok());
}

#[test]
fn test_validate_upload_path_uppercase_extension() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("VENDORS.CSV");
    fs::write(&path, "1,Acme Corp\n").unwrap();
    assert!(InputValidator::validate_upload_path(&path, 25).is_ok());
}

#[test]
fn test_validate_upload_path_empty() {
    assert!(InputValidator::validate_upload_path(Path::new(""), 25).is_err());
}

#[test]
fn test_validate_upload_path_missing() {
    let dir = tempdir().unwrap();
    assert!(InputValidator::validate_upload_path(&dir.path().join("missing.csv"), 25).is_err());
}

#[test]
fn test_validate_upload_path_directory() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sheet.csv");
    fs::create_dir(&sub).unwrap();
    assert!(InputValidator::validate_upload_path(&sub, 25).is_err());
}

#[test]
fn test_validate_upload_path_wrong_extension() {
    let dir = tempdir().unwrap();
    for name in ["vendors.xlsx", "vendors.txt", "vendors"] {
        let path = dir.path().join(name);
        fs::write(&path, "1,Acme Corp\n").unwrap();
        assert!(InputValidator::validate_upload_path(&path, 25).is_err(), "accepted {name}");
    }
}

#[test]
fn test_validate_upload_path_too_large() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("big.csv");
    fs::write(&path, vec![b'a'; 1024 * 1024 + 1]).unwrap();
    assert!(InputValidator::validate_upload_path(&path, 1).is_err());
    assert!(InputValidator::validate_upload_path(&path, 2).is_ok());
}

#[test]
fn test_validate_search_term_valid() {
    assert!(InputValidator::validate_search_term("Acme Plumbing, Inc.").is_ok());
    assert!(InputValidator::validate_search_term("").is_ok());
}

#[test]
fn test_validate_search_term_too_long() {
    assert!(InputValidator::validate_search_term(&"a".repeat(201)).is_err());
    assert!(InputValidator::validate_search_term(&"a".repeat(200)).is_ok());
}

#[test]
fn test_validate_search_term_control_chars() {
    assert!(InputValidator::validate_search_term("Acme\0Corp").is_err());
    assert!(InputValidator::validate_search_term("Acme\nCorp").is_err());
}

#[test]
fn test_validate_search_term_unicode() {
    assert!(InputValidator::validate_search_term("Peña Construcción").is_ok());
}

#[test]
fn test_validate_skip_rows() {
    assert!(InputValidator::validate_skip_rows(0).is_ok());
    assert!(InputValidator::validate_skip_rows(MAX_SKIP_ROWS).is_ok());
    assert!(InputValidator::validate_skip_rows(MAX_SKIP_ROWS + 1).is_err());
}

#[test]
fn test_validate_threshold() {
    assert!(InputValidator::validate_threshold(0.0).is_ok());
    assert!(InputValidator::validate_threshold(0.85).is_ok());
    assert!(InputValidator::validate_threshold(1.0).is_ok());
    assert!(InputValidator::validate_threshold(1.01).is_err());
    assert!(InputValidator::validate_threshold(-0.01).is_err());
    assert!(InputValidator::validate_threshold(f64::NAN).is_err());
}

#[test]
fn test_sanitize_text_trims_and_strips_controls() {
    assert_eq!(InputValidator::sanitize_text("  Acme Corp  "), "Acme Corp");
    assert_eq!(InputValidator::sanitize_text("Acme\0 Corp"), "Acme Corp");
    assert_eq!(InputValidator::sanitize_text("\u{7}\u{1b}"), "");
}

#[test]
fn test_sanitize_text_keeps_tabs_and_newlines_inside() {
    assert_eq!(InputValidator::sanitize_text("Suite 4\nSan Diego"), "Suite 4\nSan Diego");
    assert_eq!(InputValidator::sanitize_text("\tAcme\t"), "Acme");
}

#[test]
fn test_validate_database_url_valid() {
    assert!(InputValidator::validate_database_url("sqlite:data/vendors.db").is_ok());
    assert!(InputValidator::validate_database_url("sqlite://data/vendors.db").is_ok());
    assert!(InputValidator::validate_database_url("sqlite::memory:").is_ok());
}

#[test]
fn test_validate_database_url_invalid() {
    assert!(InputValidator::validate_database_url("").is_err());
    assert!(InputValidator::validate_database_url("   ").is_err());
    assert!(InputValidator::validate_database_url("postgres://localhost/db").is_err());
    let long_url = format!("sqlite:{}", "a".repeat(1000));
    assert!(InputValidator::validate_database_url(&long_url).is_err());
}

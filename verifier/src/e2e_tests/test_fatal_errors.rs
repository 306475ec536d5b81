//! Test the errors that stop a run before any verification.

use std::path::Path;

use crate::config::VerifyConfig;
use crate::e2e_tests::helpers::*;
use crate::storage::ReadError;
use crate::verify::{Verifier, VerifyError};

#[test]
fn test_empty_file() {
    let scratch = ScratchFile::from_bytes(&[]);
    let result = try_verify(&scratch, VerifyConfig::default());
    assert!(matches!(result, Err(VerifyError::EmptyFile)));
}

#[test]
fn test_file_shorter_than_one_page() {
    let scratch = ScratchFile::from_bytes(&[0u8; 4095]);
    let result = try_verify(&scratch, VerifyConfig::default());
    assert!(matches!(result, Err(VerifyError::EmptyFile)));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().expect("Failed to create scratch directory");
    let path = dir.path().join("absent.db");

    let error = Verifier::default()
        .verify_path(&path)
        .expect_err("missing file must fail");
    assert!(matches!(
        &error,
        VerifyError::Read(ReadError::Open { path: p, .. }) if p == &path
    ));
    assert!(error.to_string().contains("absent.db"));
}

#[test]
fn test_error_source_chain() {
    let error = Verifier::default()
        .verify_path(Path::new("/nonexistent/dir/tree.db"))
        .expect_err("missing file must fail");
    let source = std::error::Error::source(&error).expect("read error");
    assert!(std::error::Error::source(source).is_some());
}

//! Common helpers for end-to-end tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::VerifyConfig;
use crate::testing::TreeFile;
use crate::verify::{Report, Verifier, VerifyError, Violation};

/// A tree file written to a scratch directory, removed on drop.
pub struct ScratchFile {
    _dir: TempDir,
    path: PathBuf,
}

impl ScratchFile {
    #[must_use]
    pub fn new(file: &TreeFile) -> Self {
        let (dir, path) = scratch_path();
        file.write_to(&path).expect("Failed to write tree file");
        Self { _dir: dir, path }
    }

    /// Raw file contents, for files that are not a whole number of pages.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let (dir, path) = scratch_path();
        std::fs::write(&path, bytes).expect("Failed to write tree file");
        Self { _dir: dir, path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn scratch_path() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create scratch directory");
    let path = dir.path().join("tree.db");
    (dir, path)
}

/// Verify `file` from disk with the default configuration.
pub fn verify(file: &TreeFile) -> Report {
    verify_with(file, VerifyConfig::default())
}

pub fn verify_with(file: &TreeFile, config: VerifyConfig) -> Report {
    try_verify(&ScratchFile::new(file), config).expect("verification should complete")
}

pub fn try_verify(scratch: &ScratchFile, config: VerifyConfig) -> Result<Report, VerifyError> {
    Verifier::new(config).verify_path(scratch.path())
}

/// All violations, cloned.
pub fn violations(report: &Report) -> Vec<Violation> {
    report.violations().cloned().collect()
}

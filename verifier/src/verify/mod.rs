//! Structural verification of B+Tree files.
//!
//! A run has two independent passes over the same file, sharing only the
//! [`PageReader`]:
//!
//! 1. [`TreeWalker`]: breadth-first over child links, checking parent
//!    pointers, single ownership and cycles.
//! 2. [`LeafChainVerifier`]: left-most descent, then the `next_leaf` chain,
//!    checking key order and termination.
//!
//! Structural problems are collected into a [`Report`]; only I/O failures and
//! an empty file stop a run.

mod chain;
mod ownership;
mod report;
mod violation;
mod walker;

use std::io::{Read, Seek};
use std::path::Path;

pub use chain::{ChainReport, LeafChainVerifier};
pub use ownership::{Claim, OwnershipMap};
pub use report::{CRITICAL, Report, ReportDisplay, cross_check};
pub use violation::{Violation, ViolationKind};
pub use walker::{TreeWalker, VisitedNode, WalkEntry, WalkReport};

use crate::config::VerifyConfig;
use crate::storage::{PageReader, ROOT_PAGE, ReadError};

/// Errors that stop a verification run.
#[derive(Debug)]
pub enum VerifyError {
    /// The file could not be opened or read.
    Read(ReadError),
    /// The file has no complete root page.
    EmptyFile,
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(e) => write!(f, "{e}"),
            Self::EmptyFile => write!(f, "Empty file: no root page"),
        }
    }
}

impl std::error::Error for VerifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(e) => Some(e),
            Self::EmptyFile => None,
        }
    }
}

impl From<ReadError> for VerifyError {
    fn from(e: ReadError) -> Self {
        Self::Read(e)
    }
}

/// Runs both passes against one file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier {
    config: VerifyConfig,
}

impl Verifier {
    #[must_use]
    pub const fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    /// Open `path` read-only and verify it.
    pub fn verify_path(&self, path: &Path) -> Result<Report, VerifyError> {
        let mut reader = PageReader::open(path)?;
        tracing::info!(
            path = %path.display(),
            pages = reader.total_pages(),
            "verifying file"
        );
        self.verify(&mut reader)
    }

    /// Verify the tree behind `reader`.
    pub fn verify<R: Read + Seek>(&self, reader: &mut PageReader<R>) -> Result<Report, VerifyError> {
        let root = reader
            .read_page(ROOT_PAGE)?
            .ok_or(VerifyError::EmptyFile)?
            .header;

        let walk = TreeWalker::new(reader)
            .check_internal_order(self.config.check_internal_order)
            .walk()?;

        let cap = self.config.leaf_chain_cap.resolve(reader.total_pages());
        let chain = LeafChainVerifier::new(reader, cap).verify()?;

        let cross_check = cross_check(&walk, &chain);
        for violation in &cross_check {
            tracing::debug!(kind = %violation.kind(), page = violation.page(), "{violation}");
        }

        let report = Report {
            total_pages: reader.total_pages(),
            trailing_bytes: reader.trailing_bytes(),
            root,
            walk,
            chain,
            cross_check,
        };
        tracing::info!(
            nodes = report.walk.nodes().count(),
            leaves = report.chain.leaves_visited(),
            violations = report.violations().count(),
            "verification finished"
        );
        Ok(report)
    }
}

/// Verify a file with the default configuration.
pub fn verify_file(path: &Path) -> Result<Report, VerifyError> {
    Verifier::default().verify_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeafChainCap;
    use crate::storage::NO_PARENT;
    use crate::testing::{TreeFile, random_tree};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Cursor;

    fn run(file: &TreeFile) -> Report {
        Verifier::default()
            .verify(&mut file.reader())
            .expect("verify")
    }

    #[test]
    fn test_empty_source_is_fatal() {
        let mut reader = PageReader::new(Cursor::new(Vec::new())).expect("reader");
        let result = Verifier::default().verify(&mut reader);
        assert!(matches!(result, Err(VerifyError::EmptyFile)));
    }

    #[test]
    fn test_short_root_page_is_fatal() {
        let mut reader = PageReader::new(Cursor::new(vec![1u8; 100])).expect("reader");
        let result = Verifier::default().verify(&mut reader);
        assert!(matches!(result, Err(VerifyError::EmptyFile)));
    }

    #[test]
    fn test_scenario_is_clean() {
        let report = run(&TreeFile::two_leaf_scenario());

        assert!(report.is_clean(), "{report}");
        assert_eq!(report.chain.leftmost_leaf, Some(1));
        assert_eq!(report.chain.keys, vec![10, 60]);
        assert_eq!(report.total_pages, 3);
    }

    #[test]
    fn test_random_valid_trees_are_clean() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        for round in 0..200 {
            let key_count = 1 + round * 3;
            let tree = random_tree(&mut rng, key_count, 6, 5);
            let report = run(&tree.file);

            assert!(report.is_clean(), "round {round}:\n{report}");
            assert_eq!(report.chain.keys, tree.keys);
            assert_eq!(report.chain.leaves_visited(), tree.leaf_count);
            assert_eq!(report.walk.discovered_leaves.len(), tree.leaf_count);
        }
    }

    #[test]
    fn test_altered_parent_in_random_tree() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let tree = random_tree(&mut rng, 120, 4, 4);
            let mut file = tree.file;
            let total = file.reader().total_pages();
            let victim = u32::try_from(total - 1).expect("page id");
            file.set_parent(victim, i32::MAX);

            let report = run(&file);
            let violations: Vec<_> = report.violations().collect();
            assert_eq!(violations.len(), 1, "{report}");
            assert!(matches!(
                violations[0],
                Violation::ParentPointer { page, claimed: i32::MAX, .. } if *page == victim
            ));
        }
    }

    #[test]
    fn test_unchained_leaf_is_cross_checked() {
        // Leaf 2 is reachable from the root, but leaf 1 ends the chain.
        let mut file = TreeFile::new();
        file.internal(0, NO_PARENT, 2, &[(50, 1)]);
        file.leaf(1, 0, 0, &[10]);
        file.leaf(2, 0, 0, &[60]);

        let report = run(&file);
        assert_eq!(
            report.cross_check,
            vec![Violation::LeafChainMismatch {
                page: 2,
                in_chain: false,
            }]
        );
    }

    #[test]
    fn test_stray_chain_leaf_is_cross_checked() {
        let mut file = TreeFile::two_leaf_scenario();
        file.set_next(2, 3);
        file.leaf(3, 0, 0, &[70]);

        let report = run(&file);
        assert_eq!(
            report.cross_check,
            vec![Violation::LeafChainMismatch {
                page: 3,
                in_chain: true,
            }]
        );
    }

    #[test]
    fn test_page_count_cap() {
        let mut file = TreeFile::two_leaf_scenario();
        file.set_next(2, 1);

        let config = VerifyConfig {
            leaf_chain_cap: LeafChainCap::PageCount,
            ..VerifyConfig::default()
        };
        let report = Verifier::new(config)
            .verify(&mut file.reader())
            .expect("verify");

        assert_eq!(report.chain.leaves_visited(), 3);
        assert_eq!(report.count(ViolationKind::ChainCycle), 1);
        assert!(report.cross_check.is_empty());
    }
}

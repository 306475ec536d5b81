//! Test that looping `next` pointers stop at the cap.

use crate::config::{LeafChainCap, VerifyConfig};
use crate::e2e_tests::helpers::*;
use crate::testing::TreeFile;
use crate::verify::{Violation, ViolationKind};

#[test]
fn test_leaf_pointing_at_itself() {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_next(1, 1);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::ChainCycle {
            page: 1,
            cap: LeafChainCap::DEFAULT_LEAVES,
        }]
    );
    assert_eq!(report.chain.leaves_visited(), LeafChainCap::DEFAULT_LEAVES);
    assert!(!report.chain.terminated);
}

#[test]
fn test_two_leaf_loop() {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_next(2, 1);

    let report = verify(&file);
    assert_eq!(report.count(ViolationKind::ChainCycle), 1);
    assert_eq!(report.chain.leaves_visited(), LeafChainCap::DEFAULT_LEAVES);
    // Key 10 after 60, on every lap but the first.
    assert_eq!(
        report.count(ViolationKind::SortOrder),
        LeafChainCap::DEFAULT_LEAVES / 2 - 1
    );
    assert!(report.cross_check.is_empty());
}

#[test]
fn test_cap_from_page_count() {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_next(1, 1);

    let config = VerifyConfig {
        leaf_chain_cap: LeafChainCap::PageCount,
        ..VerifyConfig::default()
    };
    let report = verify_with(&file, config);
    assert_eq!(
        violations(&report),
        vec![Violation::ChainCycle { page: 1, cap: 3 }]
    );
}

#[test]
fn test_chain_ending_early_is_cross_checked() {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_next(1, 0);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::LeafChainMismatch {
            page: 2,
            in_chain: false,
        }]
    );
}

#[test]
fn test_chain_of_exactly_cap_leaves_is_clean() {
    let config = VerifyConfig {
        leaf_chain_cap: LeafChainCap::Fixed(2),
        ..VerifyConfig::default()
    };
    let report = verify_with(&TreeFile::two_leaf_scenario(), config);

    assert!(report.is_clean(), "{report}");
    assert!(report.chain.terminated);
    assert_eq!(report.chain.leaves_visited(), 2);
}

#[test]
fn test_left_most_child_past_end_is_reported_once() {
    let mut file = TreeFile::new();
    file.internal(0, crate::storage::NO_PARENT, 1, &[(10, 40)]);
    file.leaf(1, 0, 0, &[20]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::MissingPage {
            page: 40,
            referenced_by: Some(0),
        }]
    );
    assert_eq!(report.chain.leftmost_leaf, None);
}

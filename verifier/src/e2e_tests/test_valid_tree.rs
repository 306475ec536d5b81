//! Test that a well-formed two-leaf tree verifies cleanly.

use crate::e2e_tests::helpers::*;
use crate::storage::NO_PARENT;
use crate::testing::TreeFile;

#[test]
fn test_two_leaf_tree_is_clean() {
    let report = verify(&TreeFile::two_leaf_scenario());

    assert!(report.is_clean(), "{report}");
    assert_eq!(report.chain.leftmost_leaf, Some(1));
    assert_eq!(report.chain.keys, vec![10, 60]);
    assert_eq!(report.chain.leaves_visited(), 2);
    assert!(report.chain.terminated);
}

#[test]
fn test_single_leaf_root_is_clean() {
    let mut file = TreeFile::new();
    file.leaf(0, NO_PARENT, 0, &[-4, 0, 0, 9]);

    let report = verify(&file);
    assert!(report.is_clean(), "{report}");
    assert_eq!(report.chain.leftmost_leaf, Some(0));
    assert_eq!(report.chain.keys, vec![-4, 0, 0, 9]);
}

#[test]
fn test_three_level_tree_is_clean() {
    // 0 -> {5 (keys <= 20), 6}; 5 -> {1, 2}; 6 -> {3, 4}
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 6, &[(20, 5)]);
    file.leaf(1, 5, 2, &[1, 10]);
    file.leaf(2, 5, 3, &[15, 20]);
    file.leaf(3, 6, 4, &[25, 30]);
    file.leaf(4, 6, 0, &[35]);
    file.internal(5, 0, 2, &[(10, 1)]);
    file.internal(6, 0, 4, &[(30, 3)]);

    let report = verify(&file);
    assert!(report.is_clean(), "{report}");
    assert_eq!(report.chain.leftmost_leaf, Some(1));
    assert_eq!(report.chain.leaves, vec![1, 2, 3, 4]);
    assert_eq!(report.walk.nodes().count(), 7);
}

#[test]
fn test_trailing_partial_page_is_ignored() {
    let mut bytes = TreeFile::two_leaf_scenario().bytes();
    bytes.extend_from_slice(&[0xAB; 100]);
    let scratch = ScratchFile::from_bytes(&bytes);

    let report = try_verify(&scratch, crate::config::VerifyConfig::default()).expect("verify");
    assert!(report.is_clean(), "{report}");
    assert_eq!(report.total_pages, 3);
    assert_eq!(report.trailing_bytes, 100);
}

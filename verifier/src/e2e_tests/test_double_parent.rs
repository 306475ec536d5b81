//! Test that a child referenced by two internal nodes is reported.

use crate::e2e_tests::helpers::*;
use crate::storage::NO_PARENT;
use crate::testing::TreeFile;
use crate::verify::{Violation, ViolationKind};

#[test]
fn test_shared_leaf_between_siblings() {
    // 0 -> {4, 3}; 4 -> {5, 2}; 3 -> {2, 1}. The root's right child 4 is
    // visited first, so it owns page 2 and 3 is the second claimant.
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 4, &[(20, 3)]);
    file.leaf(1, 3, 2, &[5]);
    file.leaf(2, 4, 5, &[15]);
    file.internal(3, 0, 2, &[(10, 1)]);
    file.internal(4, 0, 5, &[(30, 2)]);
    file.leaf(5, 4, 0, &[40]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::DoubleParent {
            child: 2,
            owner: 4,
            claimant: 3,
        }]
    );
    assert_eq!(report.count(ViolationKind::DoubleParent), 1);
}

#[test]
fn test_same_child_twice_in_one_node() {
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 1, &[(10, 1)]);
    file.leaf(1, 0, 0, &[1]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::DoubleParent {
            child: 1,
            owner: 0,
            claimant: 0,
        }]
    );
}

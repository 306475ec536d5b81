//! Test that a wrong stored parent is reported exactly once.

use crate::e2e_tests::helpers::*;
use crate::storage::NO_PARENT;
use crate::testing::TreeFile;
use crate::verify::Violation;

#[test]
fn test_wrong_parent_on_right_child() {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_parent(2, 5);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::ParentPointer {
            page: 2,
            claimed: 5,
            actual: 0,
        }]
    );
}

#[test]
fn test_wrong_parent_in_deeper_level() {
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 6, &[(20, 5)]);
    file.leaf(1, 5, 2, &[1]);
    file.leaf(2, 5, 3, &[20]);
    file.leaf(3, 6, 4, &[25]);
    file.leaf(4, 5, 0, &[35]);
    file.internal(5, 0, 2, &[(10, 1)]);
    file.internal(6, 0, 4, &[(30, 3)]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::ParentPointer {
            page: 4,
            claimed: 5,
            actual: 6,
        }]
    );
}

#[test]
fn test_negative_parent_on_non_root() {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_parent(1, NO_PARENT);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::ParentPointer {
            page: 1,
            claimed: NO_PARENT,
            actual: 0,
        }]
    );
}

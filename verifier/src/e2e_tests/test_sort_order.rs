//! Test key-order checks along the leaf chain.

use crate::e2e_tests::helpers::*;
use crate::storage::NO_PARENT;
use crate::testing::TreeFile;
use crate::verify::Violation;

#[test]
fn test_key_lower_than_previous_leaf() {
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 2, &[(50, 1)]);
    file.leaf(1, 0, 2, &[10]);
    file.leaf(2, 0, 0, &[5]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::SortOrder {
            page: 2,
            key: 5,
            watermark: 10,
        }]
    );
    assert_eq!(report.chain.keys, vec![10, 5]);
}

#[test]
fn test_disorder_inside_one_leaf() {
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 2, &[(50, 1)]);
    file.leaf(1, 0, 2, &[10, 30, 20]);
    file.leaf(2, 0, 0, &[60]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::SortOrder {
            page: 1,
            key: 20,
            watermark: 30,
        }]
    );
}

#[test]
fn test_duplicate_keys_across_leaves() {
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 2, &[(10, 1)]);
    file.leaf(1, 0, 2, &[10, 10]);
    file.leaf(2, 0, 0, &[10, 11]);

    assert!(verify(&file).is_clean());
}

#[test]
fn test_internal_key_order_when_enabled() {
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 3, &[(40, 1), (20, 2)]);
    file.leaf(1, 0, 2, &[10]);
    file.leaf(2, 0, 3, &[15]);
    file.leaf(3, 0, 0, &[50]);

    assert!(verify(&file).is_clean());

    let config = crate::config::VerifyConfig {
        check_internal_order: true,
        ..Default::default()
    };
    let report = verify_with(&file, config);
    assert_eq!(
        violations(&report),
        vec![Violation::InternalKeyOrder {
            page: 0,
            index: 1,
            key: 20,
            previous: 40,
        }]
    );
}

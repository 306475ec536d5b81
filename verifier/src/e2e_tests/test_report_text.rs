//! Test the rendered report.

use crate::e2e_tests::helpers::*;
use crate::testing::TreeFile;
use crate::verify::CRITICAL;

#[test]
fn test_clean_report_dump() {
    let text = verify(&TreeFile::two_leaf_scenario()).to_string();

    assert!(text.starts_with("ROOT: Page 0, Type: INTERNAL, IsRoot: 1, Parent: -1, Cells: 1\n"));
    assert!(text.contains("[Page 0] Type: INTERNAL, Parent: -1, Cells: 1\n"));
    assert!(text.contains("  -> Right Child: 2\n"));
    assert!(text.contains("  -> Key: 50, Child: 1\n"));
    assert!(text.contains("[Page 1] Type: LEAF, Parent: 0, Cells: 1\n"));
    assert!(text.contains("  Keys: [10]\n"));
    assert!(text.contains("  Left-most leaf: 1\n"));
    assert!(text.contains("  Keys: [10, 60]\n"));
    assert!(text.contains("No violations found."));
    assert!(!text.contains(CRITICAL));
}

#[test]
fn test_violation_is_printed_after_its_node() {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_parent(2, 5);

    let text = verify(&file).to_string();
    let node = text.find("[Page 2]").expect("page 2 dump");
    let error = text
        .find(">>> CRITICAL ERROR: Page 2 thinks parent is 5, but it is actually child of 0")
        .expect("violation line");
    let next = text.find("[Page 1]").expect("page 1 dump");

    assert!(node < error && error < next, "{text}");
    assert!(text.contains("1 violations (parent-pointer: 1)"));
}

#[test]
fn test_quiet_report_omits_dumps() {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_parent(2, 5);

    let report = verify(&file);
    let text = report.display(true).to_string();

    assert!(!text.contains("[Page"));
    assert!(!text.contains("Keys:"));
    assert_eq!(text.matches(CRITICAL).count(), 1);
    assert!(text.contains("Summary: 3 pages, 3 nodes reachable, 2 leaves in chain"));
}

#[test]
fn test_double_parent_line() {
    let mut file = TreeFile::new();
    file.internal(0, crate::storage::NO_PARENT, 1, &[(10, 1)]);
    file.leaf(1, 0, 0, &[1]);

    let text = verify(&file).to_string();
    assert!(text.contains(
        "Page 1 is owned by multiple parents! (Double Parent Bug: owned by 0, also claimed by 0)"
    ));
}

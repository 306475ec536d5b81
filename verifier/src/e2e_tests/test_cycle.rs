//! Test that pointer cycles terminate and are reported.

use crate::e2e_tests::helpers::*;
use crate::storage::NO_PARENT;
use crate::testing::TreeFile;
use crate::verify::{Violation, ViolationKind};

#[test]
fn test_back_edge_to_root() {
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 1, &[(10, 2)]);
    file.internal(1, 0, 0, &[]);
    file.leaf(2, 0, 0, &[4]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![Violation::Cycle { page: 0, via: 1 }]
    );
    assert_eq!(report.walk.nodes().count(), 3);
}

#[test]
fn test_back_edge_to_inner_ancestor() {
    // 0 -> 1 -> 2 -> {1, 3}
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 1, &[]);
    file.internal(1, 0, 2, &[]);
    file.internal(2, 1, 1, &[(5, 3)]);
    file.leaf(3, 2, 0, &[5]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![
            Violation::DoubleParent {
                child: 1,
                owner: 0,
                claimant: 2,
            },
            Violation::Cycle { page: 1, via: 2 },
        ]
    );
    assert_eq!(report.chain.leftmost_leaf, Some(3));
}

#[test]
fn test_every_page_points_at_the_next() {
    // A ring through all pages, with no leaves at all.
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 1, &[]);
    for page in 1..20 {
        file.internal(page, (page - 1) as i32, (page + 1) % 20, &[]);
    }

    let report = verify(&file);
    assert_eq!(
        report.walk.violations().cloned().collect::<Vec<_>>(),
        vec![Violation::Cycle { page: 0, via: 19 }]
    );
    assert_eq!(report.walk.nodes().count(), 20);
    assert_eq!(report.chain.leftmost_leaf, None);
    assert!(report.chain.violations.contains(&Violation::DescentLoop { page: 0 }));
}

#[test]
fn test_loop_between_pages_owned_by_the_root() {
    // 0 -> {2, 4, 1}, 2 -> 3, 3 -> 1, 1 -> 2. Both references that close
    // the loop hit pages owned by the root, not ancestors of the referrer.
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 2, &[(10, 4), (20, 1)]);
    file.internal(1, 0, 2, &[]);
    file.internal(2, 0, 3, &[]);
    file.internal(3, 2, 1, &[]);
    file.leaf(4, 0, 0, &[5]);

    let report = verify(&file);
    assert_eq!(report.count(ViolationKind::Cycle), 1, "{report}");
    assert!(report
        .violations()
        .any(|v| *v == Violation::Cycle { page: 2, via: 1 }));
    assert_eq!(report.count(ViolationKind::DoubleParent), 2);
    assert!(report.chain.terminated);
}

#[test]
fn test_root_referenced_twice() {
    let mut file = TreeFile::new();
    file.internal(0, NO_PARENT, 1, &[(10, 2)]);
    file.internal(1, 0, 0, &[(5, 0)]);
    file.leaf(2, 0, 0, &[4]);

    let report = verify(&file);
    assert_eq!(
        violations(&report),
        vec![
            Violation::Cycle { page: 0, via: 1 },
            Violation::Cycle { page: 0, via: 1 },
        ]
    );
}

//! Test what the default log filter lets through.

use crate::config::{DEFAULT_LOG_FILTER, VerifyConfig};
use crate::e2e_tests::helpers::*;
use crate::testing::{TreeFile, capture_logs};

fn bad_parent_file() -> TreeFile {
    let mut file = TreeFile::two_leaf_scenario();
    file.set_parent(2, 5);
    file
}

#[test]
fn test_default_filter_keeps_violations_in_the_report() {
    let scratch = ScratchFile::new(&bad_parent_file());

    let (report, logs) = capture_logs(DEFAULT_LOG_FILTER, || {
        try_verify(&scratch, VerifyConfig::default()).expect("verify")
    });

    assert_eq!(report.violations().count(), 1);
    assert!(logs.contains("verification finished"), "{logs}");
    assert!(!logs.contains("thinks parent is"), "{logs}");
}

#[test]
fn test_debug_filter_logs_each_violation() {
    let scratch = ScratchFile::new(&bad_parent_file());

    let (_, logs) = capture_logs("btree_verify=debug", || {
        try_verify(&scratch, VerifyConfig::default()).expect("verify")
    });

    assert_eq!(logs.matches("thinks parent is 5").count(), 1, "{logs}");
}

// Structural verifier for on-disk B+Tree files.
//
// A run:
// 1. Open the file read-only and measure it in whole pages
// 2. Walk the tree breadth-first from page 0:
//     - Claim every child for the node that references it
//     - Check each node's stored parent against its claim
//     - Report double parents, cycles and dangling references
// 3. Descend to the left-most leaf and follow the leaf chain:
//     - Check that keys never decrease
//     - Stop at the end marker or the configured cap
// 4. Cross-check the leaves found by both passes
// 5. Render the report
//
// Nothing is ever written back to the file.

// Test code is allowed to use expect() and unchecked casts for convenience.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap
    )
)]

pub mod config;
pub mod storage;
pub mod verify;

mod e2e_tests;
#[cfg(test)]
mod testing;

pub use config::{ConfigError, LeafChainCap, VerifyConfig};
pub use verify::{Report, Verifier, VerifyError, Violation, ViolationKind, verify_file};

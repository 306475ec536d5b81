//! End-to-end tests over whole tree files on disk.
//!
//! Each test file covers one scenario: build a file with
//! [`crate::testing::TreeFile`], write it to a scratch directory, and run the
//! full verifier against the path.

#![cfg(test)]

mod helpers;

mod test_chain_loop;
mod test_cycle;
mod test_double_parent;
mod test_fatal_errors;
mod test_logging;
mod test_parent_pointer;
mod test_random_trees;
mod test_report_text;
mod test_sort_order;
mod test_valid_tree;

//! Leaf-chain verification.
//!
//! Independent of the tree walk: this pass finds the left-most leaf by
//! descending from the root, then follows `next_leaf` pointers to the end of
//! the chain, checking that keys never decrease.

use std::collections::HashSet;
use std::io::{Read, Seek};

use crate::storage::{END_OF_CHAIN, LeafNode, Node, PageId, PageReader, ROOT_PAGE, ReadError};
use crate::verify::violation::Violation;

/// Result of the chain pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainReport {
    /// Where the chain starts, if the descent reached a leaf.
    pub leftmost_leaf: Option<PageId>,
    /// Leaves in chain order.
    pub leaves: Vec<PageId>,
    /// Every key in chain order.
    pub keys: Vec<i32>,
    /// Whether the chain reached the end marker.
    pub terminated: bool,
    pub violations: Vec<Violation>,
}

impl ChainReport {
    #[must_use]
    pub fn leaves_visited(&self) -> usize {
        self.leaves.len()
    }
}

/// Walks the leaf chain from the left-most leaf.
pub struct LeafChainVerifier<'a, R> {
    reader: &'a mut PageReader<R>,
    cap: usize,
    report: ChainReport,
}

impl<'a, R: Read + Seek> LeafChainVerifier<'a, R> {
    /// `cap` is the largest number of leaves the chain may contain before it
    /// is treated as looping.
    pub fn new(reader: &'a mut PageReader<R>, cap: usize) -> Self {
        Self {
            reader,
            cap,
            report: ChainReport::default(),
        }
    }

    pub fn verify(mut self) -> Result<ChainReport, ReadError> {
        let Some(first) = self.find_leftmost_leaf()? else {
            return Ok(self.report);
        };
        self.report.leftmost_leaf = Some(first);
        tracing::debug!(page = first, "left-most leaf");

        self.walk_chain(first)?;

        tracing::debug!(
            leaves = self.report.leaves.len(),
            keys = self.report.keys.len(),
            terminated = self.report.terminated,
            "leaf chain walk finished"
        );
        Ok(self.report)
    }

    /// Descend along the left-most child of every internal node.
    fn find_leftmost_leaf(&mut self) -> Result<Option<PageId>, ReadError> {
        let mut seen = HashSet::new();
        let mut current = ROOT_PAGE;
        let mut parent = None;

        loop {
            if !seen.insert(current) {
                self.record(Violation::DescentLoop { page: current });
                return Ok(None);
            }

            let Some(loaded) = self.reader.read_page(current)? else {
                // The descent only follows child references, and the tree
                // walk already reports those that point past the end.
                tracing::debug!(page = current, ?parent, "left-most descent left the file");
                return Ok(None);
            };

            match Node::decode(loaded.header, &loaded.page) {
                Ok(Node::Leaf(_)) => return Ok(Some(current)),
                Ok(Node::Internal(node)) => {
                    parent = Some(current);
                    current = node.leftmost_child();
                }
                Err(_) => {
                    self.record(Violation::NotALeaf {
                        page: current,
                        referenced_by: parent,
                    });
                    return Ok(None);
                }
            }
        }
    }

    fn walk_chain(&mut self, first: PageId) -> Result<(), ReadError> {
        let mut current = first;
        let mut previous = None;
        let mut watermark: Option<i32> = None;

        loop {
            if self.report.leaves.len() >= self.cap {
                self.record(Violation::ChainCycle {
                    page: current,
                    cap: self.cap,
                });
                return Ok(());
            }

            let Some(leaf) = self.read_leaf(current, previous)? else {
                return Ok(());
            };

            self.report.leaves.push(current);
            for key in leaf.keys() {
                match watermark {
                    Some(mark) if key < mark => self.record(Violation::SortOrder {
                        page: current,
                        key,
                        watermark: mark,
                    }),
                    _ => {}
                }
                // Drop to the offending key so one bad key is reported once.
                watermark = Some(key);
                self.report.keys.push(key);
            }

            if leaf.next_leaf == END_OF_CHAIN {
                self.report.terminated = true;
                return Ok(());
            }
            previous = Some(current);
            current = leaf.next_leaf;
        }
    }

    /// Read a chain member, recording why it could not be used if it is not
    /// a leaf.
    fn read_leaf(
        &mut self,
        page_id: PageId,
        previous: Option<PageId>,
    ) -> Result<Option<LeafNode>, ReadError> {
        let Some(loaded) = self.reader.read_page(page_id)? else {
            self.record(Violation::MissingPage {
                page: page_id,
                referenced_by: previous,
            });
            return Ok(None);
        };

        match Node::decode(loaded.header, &loaded.page) {
            Ok(Node::Leaf(leaf)) => Ok(Some(leaf)),
            Ok(Node::Internal(_)) | Err(_) => {
                self.record(Violation::NotALeaf {
                    page: page_id,
                    referenced_by: previous,
                });
                Ok(None)
            }
        }
    }

    fn record(&mut self, violation: Violation) {
        tracing::debug!(kind = %violation.kind(), page = violation.page(), "{violation}");
        self.report.violations.push(violation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NO_PARENT;
    use crate::testing::TreeFile;

    const CAP: usize = 1000;

    fn verify(file: &TreeFile, cap: usize) -> ChainReport {
        let mut reader = file.reader();
        LeafChainVerifier::new(&mut reader, cap)
            .verify()
            .expect("verify")
    }

    #[test]
    fn test_two_leaf_chain() {
        let report = verify(&TreeFile::two_leaf_scenario(), CAP);

        assert_eq!(report.leftmost_leaf, Some(1));
        assert_eq!(report.leaves, vec![1, 2]);
        assert_eq!(report.keys, vec![10, 60]);
        assert!(report.terminated);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_root_leaf_is_its_own_chain() {
        let mut file = TreeFile::new();
        file.leaf(0, NO_PARENT, 0, &[3, 3, 4]);

        let report = verify(&file, CAP);
        assert_eq!(report.leftmost_leaf, Some(0));
        assert_eq!(report.leaves_visited(), 1);
        assert_eq!(report.keys, vec![3, 3, 4]);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_descent_uses_right_child_of_empty_internal() {
        let mut file = TreeFile::new();
        file.internal(0, NO_PARENT, 1, &[]);
        file.internal(1, 0, 2, &[(5, 3)]);
        file.leaf(2, 1, 0, &[9]);
        file.leaf(3, 1, 2, &[1, 5]);

        let report = verify(&file, CAP);
        assert_eq!(report.leftmost_leaf, Some(3));
        assert_eq!(report.keys, vec![1, 5, 9]);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_each_descent_is_reported() {
        let mut file = TreeFile::new();
        file.internal(0, NO_PARENT, 3, &[(20, 1), (40, 2)]);
        file.leaf(1, 0, 2, &[10, 30]);
        file.leaf(2, 0, 3, &[25, 35]);
        file.leaf(3, 0, 0, &[5, 50]);

        let report = verify(&file, CAP);
        assert_eq!(
            report.violations,
            vec![
                Violation::SortOrder {
                    page: 2,
                    key: 25,
                    watermark: 30,
                },
                Violation::SortOrder {
                    page: 3,
                    key: 5,
                    watermark: 35,
                },
            ]
        );
        assert!(report.terminated);
    }

    #[test]
    fn test_equal_keys_are_in_order() {
        let mut file = TreeFile::new();
        file.internal(0, NO_PARENT, 2, &[(7, 1)]);
        file.leaf(1, 0, 2, &[7, 7]);
        file.leaf(2, 0, 0, &[7, 8]);

        assert!(verify(&file, CAP).violations.is_empty());
    }

    #[test]
    fn test_looping_chain_stops_at_cap() {
        let mut file = TreeFile::new();
        file.internal(0, NO_PARENT, 2, &[(50, 1)]);
        file.leaf(1, 0, 2, &[10]);
        file.leaf(2, 0, 1, &[60]);

        let report = verify(&file, 8);
        assert_eq!(report.leaves_visited(), 8);
        assert!(!report.terminated);
        assert_eq!(
            report.violations.last(),
            Some(&Violation::ChainCycle { page: 1, cap: 8 })
        );
    }

    #[test]
    fn test_chain_of_exactly_cap_leaves() {
        let report = verify(&TreeFile::two_leaf_scenario(), 2);

        assert_eq!(report.leaves_visited(), 2);
        assert!(report.terminated);
        assert!(report.violations.is_empty());

        let report = verify(&TreeFile::two_leaf_scenario(), 1);
        assert_eq!(
            report.violations,
            vec![Violation::ChainCycle { page: 2, cap: 1 }]
        );
        assert!(!report.terminated);
    }

    #[test]
    fn test_descent_past_end_of_file_is_left_to_the_walk() {
        let mut file = TreeFile::new();
        file.internal(0, NO_PARENT, 1, &[(10, 40)]);
        file.leaf(1, 0, 0, &[20]);

        let report = verify(&file, CAP);
        assert_eq!(report.leftmost_leaf, None);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_chain_into_internal_page() {
        let mut file = TreeFile::new();
        file.internal(0, NO_PARENT, 2, &[(50, 1)]);
        file.leaf(1, 0, 0, &[10]);
        file.leaf(2, 0, 0, &[60]);
        file.set_next(1, 3);
        file.internal(3, 0, 2, &[]);

        let report = verify(&file, CAP);
        assert_eq!(
            report.violations,
            vec![Violation::NotALeaf {
                page: 3,
                referenced_by: Some(1),
            }]
        );
        assert!(!report.terminated);
    }

    #[test]
    fn test_chain_past_end_of_file() {
        let mut file = TreeFile::new();
        file.leaf(0, NO_PARENT, 0, &[1]);
        file.set_next(0, 12);

        let report = verify(&file, CAP);
        assert_eq!(
            report.violations,
            vec![Violation::MissingPage {
                page: 12,
                referenced_by: Some(0),
            }]
        );
    }

    #[test]
    fn test_descent_loop_terminates() {
        let mut file = TreeFile::new();
        file.internal(0, NO_PARENT, 1, &[]);
        file.internal(1, 0, 0, &[]);

        let report = verify(&file, CAP);
        assert_eq!(report.leftmost_leaf, None);
        assert_eq!(report.violations, vec![Violation::DescentLoop { page: 0 }]);
    }
}

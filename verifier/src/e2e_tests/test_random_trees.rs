//! Test that randomly shaped valid trees verify cleanly from disk.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::e2e_tests::helpers::*;
use crate::testing::random_tree;
use crate::verify::{Violation, ViolationKind};

const SEEDS: [u64; 5] = [1, 7, 99, 2024, 0xDEAD_BEEF];

#[test]
fn test_random_trees_are_clean() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        for key_count in [1, 2, 17, 250, 1500] {
            let tree = random_tree(&mut rng, key_count, 8, 6);
            let report = verify(&tree.file);

            assert!(report.is_clean(), "seed {seed}, {key_count} keys:\n{report}");
            assert_eq!(report.chain.keys, tree.keys);
            assert_eq!(report.chain.leaves_visited(), tree.leaf_count);
        }
    }
}

#[test]
fn test_random_tree_with_one_bad_parent() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let tree = random_tree(&mut rng, 300, 5, 4);
        let mut file = tree.file;
        file.set_parent(1, 9999);

        let report = verify(&file);
        let found = violations(&report);
        assert_eq!(found.len(), 1, "seed {seed}:\n{report}");
        assert!(matches!(
            found[0],
            Violation::ParentPointer {
                page: 1,
                claimed: 9999,
                ..
            }
        ));
    }
}

#[test]
fn test_random_tree_with_swapped_leaf_keys() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let tree = random_tree(&mut rng, 400, 5, 4);
        let mut file = tree.file;

        // A key below the global minimum in the last leaf is out of order
        // exactly once.
        let last_leaf = last_leaf(&verify(&file));
        let minimum = tree.keys[0];
        file.page_mut(last_leaf).write_i32(12, minimum - 1);

        let report = verify(&file);
        assert_eq!(report.count(ViolationKind::SortOrder), 1, "seed {seed}");
    }
}

fn last_leaf(report: &crate::verify::Report) -> u32 {
    *report.chain.leaves.last().expect("chain has leaves")
}

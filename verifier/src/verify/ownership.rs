//! Child to parent ownership tracking.

use std::collections::HashMap;

use crate::storage::PageId;

/// Outcome of [`OwnershipMap::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The child had no owner and now belongs to the claimant.
    Granted,
    /// The child already belongs to `owner`. The mapping is unchanged.
    Conflict { owner: PageId },
}

/// Maps every child page to the parent that first referenced it.
///
/// The first claim wins. Later claims on the same child are rejected and
/// reported to the caller instead of overwriting the owner.
#[derive(Debug, Default)]
pub struct OwnershipMap {
    owners: HashMap<PageId, PageId>,
}

impl OwnershipMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `parent` as the owner of `child` unless it already has one.
    pub fn claim(&mut self, child: PageId, parent: PageId) -> Claim {
        match self.owners.get(&child) {
            Some(&owner) => Claim::Conflict { owner },
            None => {
                self.owners.insert(child, parent);
                Claim::Granted
            }
        }
    }

    /// The recorded owner of `child`, if any.
    #[must_use]
    pub fn owner(&self, child: PageId) -> Option<PageId> {
        self.owners.get(&child).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_claim_wins() {
        let mut owners = OwnershipMap::new();
        assert!(owners.is_empty());

        assert_eq!(owners.claim(4, 1), Claim::Granted);
        assert_eq!(owners.claim(4, 2), Claim::Conflict { owner: 1 });
        assert_eq!(owners.claim(4, 3), Claim::Conflict { owner: 1 });

        assert_eq!(owners.owner(4), Some(1));
        assert_eq!(owners.len(), 1);
    }

    #[test]
    fn test_unknown_child_has_no_owner() {
        let owners = OwnershipMap::new();
        assert_eq!(owners.owner(9), None);
    }
}

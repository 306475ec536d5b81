//! Structural violations.
//!
//! A violation is never fatal: each one is recorded where it is detected and
//! the pass continues.

use crate::storage::PageId;

/// Classification of a [`Violation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViolationKind {
    Cycle,
    ParentPointer,
    Orphan,
    DoubleParent,
    RootHeader,
    MissingPage,
    UnknownKind,
    CellCountOverflow,
    InternalKeyOrder,
    SortOrder,
    ChainCycle,
    NotALeaf,
    DescentLoop,
    LeafChainMismatch,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Cycle => "cycle",
            Self::ParentPointer => "parent-pointer",
            Self::Orphan => "orphan",
            Self::DoubleParent => "double-parent",
            Self::RootHeader => "root-header",
            Self::MissingPage => "missing-page",
            Self::UnknownKind => "unknown-kind",
            Self::CellCountOverflow => "cell-count-overflow",
            Self::InternalKeyOrder => "internal-key-order",
            Self::SortOrder => "sort-order",
            Self::ChainCycle => "chain-cycle",
            Self::NotALeaf => "not-a-leaf",
            Self::DescentLoop => "descent-loop",
            Self::LeafChainMismatch => "leaf-chain-mismatch",
        };
        f.write_str(name)
    }
}

/// A structural problem found in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A page is its own descendant. `via` is the node whose child reference
    /// closes the loop.
    Cycle { page: PageId, via: PageId },
    /// A page's stored parent differs from the node that references it.
    ParentPointer {
        page: PageId,
        claimed: i32,
        actual: PageId,
    },
    /// A non-root page was visited without any recorded owner.
    Orphan { page: PageId, claimed: i32 },
    /// A child page is referenced by a second parent. The first owner keeps
    /// the page.
    DoubleParent {
        child: PageId,
        owner: PageId,
        claimant: PageId,
    },
    /// The root page carries a parent other than the sentinel.
    RootHeader { parent: i32 },
    /// A reference points past the last complete page of the file.
    MissingPage {
        page: PageId,
        referenced_by: Option<PageId>,
    },
    /// The kind byte is neither internal nor leaf.
    UnknownKind { page: PageId, kind: u8 },
    /// The declared cell count does not fit in a page.
    CellCountOverflow {
        page: PageId,
        declared: u16,
        capacity: usize,
    },
    /// Keys within one internal node decrease.
    InternalKeyOrder {
        page: PageId,
        index: usize,
        key: i32,
        previous: i32,
    },
    /// A key in the leaf chain is lower than the key before it.
    SortOrder {
        page: PageId,
        key: i32,
        watermark: i32,
    },
    /// The leaf chain did not reach the end marker within the cap.
    ChainCycle { page: PageId, cap: usize },
    /// The left-most descent or the leaf chain reached a page that is not a
    /// leaf.
    NotALeaf {
        page: PageId,
        referenced_by: Option<PageId>,
    },
    /// The left-most descent revisited a page.
    DescentLoop { page: PageId },
    /// The tree walk and the leaf chain disagree about a leaf.
    LeafChainMismatch { page: PageId, in_chain: bool },
}

impl Violation {
    #[must_use]
    pub const fn kind(&self) -> ViolationKind {
        match self {
            Self::Cycle { .. } => ViolationKind::Cycle,
            Self::ParentPointer { .. } => ViolationKind::ParentPointer,
            Self::Orphan { .. } => ViolationKind::Orphan,
            Self::DoubleParent { .. } => ViolationKind::DoubleParent,
            Self::RootHeader { .. } => ViolationKind::RootHeader,
            Self::MissingPage { .. } => ViolationKind::MissingPage,
            Self::UnknownKind { .. } => ViolationKind::UnknownKind,
            Self::CellCountOverflow { .. } => ViolationKind::CellCountOverflow,
            Self::InternalKeyOrder { .. } => ViolationKind::InternalKeyOrder,
            Self::SortOrder { .. } => ViolationKind::SortOrder,
            Self::ChainCycle { .. } => ViolationKind::ChainCycle,
            Self::NotALeaf { .. } => ViolationKind::NotALeaf,
            Self::DescentLoop { .. } => ViolationKind::DescentLoop,
            Self::LeafChainMismatch { .. } => ViolationKind::LeafChainMismatch,
        }
    }

    /// The offending page.
    #[must_use]
    pub const fn page(&self) -> PageId {
        match self {
            Self::Cycle { page, .. }
            | Self::ParentPointer { page, .. }
            | Self::Orphan { page, .. }
            | Self::MissingPage { page, .. }
            | Self::UnknownKind { page, .. }
            | Self::CellCountOverflow { page, .. }
            | Self::InternalKeyOrder { page, .. }
            | Self::SortOrder { page, .. }
            | Self::ChainCycle { page, .. }
            | Self::NotALeaf { page, .. }
            | Self::DescentLoop { page }
            | Self::LeafChainMismatch { page, .. } => *page,
            Self::DoubleParent { child, .. } => *child,
            Self::RootHeader { .. } => crate::storage::ROOT_PAGE,
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle { page, via } => write!(
                f,
                "Cycle detected at Page {page} (Page {via} references its own ancestor)"
            ),
            Self::ParentPointer {
                page,
                claimed,
                actual,
            } => write!(
                f,
                "Page {page} thinks parent is {claimed}, but it is actually child of {actual}"
            ),
            Self::Orphan { page, claimed } => write!(
                f,
                "Page {page} thinks parent is {claimed}, but no page owns it"
            ),
            Self::DoubleParent {
                child,
                owner,
                claimant,
            } => write!(
                f,
                "Page {child} is owned by multiple parents! (Double Parent Bug: \
                 owned by {owner}, also claimed by {claimant})"
            ),
            Self::RootHeader { parent } => {
                write!(f, "Root page 0 has parent {parent}, expected -1 or 0")
            }
            Self::MissingPage {
                page,
                referenced_by: Some(from),
            } => write!(f, "Page {from} references Page {page}, which is past the end of the file"),
            Self::MissingPage {
                page,
                referenced_by: None,
            } => write!(f, "Page {page} is past the end of the file"),
            Self::UnknownKind { page, kind } => {
                write!(f, "Page {page} has unknown node kind 0x{kind:02x}")
            }
            Self::CellCountOverflow {
                page,
                declared,
                capacity,
            } => write!(
                f,
                "Page {page} declares {declared} cells, but only {capacity} fit in a page"
            ),
            Self::InternalKeyOrder {
                page,
                index,
                key,
                previous,
            } => write!(
                f,
                "Page {page} cell {index} has key {key}, lower than the previous key {previous}"
            ),
            Self::SortOrder {
                page,
                key,
                watermark,
            } => write!(
                f,
                "Leaf chain out of order at Page {page}: key {key} follows {watermark}"
            ),
            Self::ChainCycle { page, cap } => write!(
                f,
                "Leaf chain did not terminate within {cap} leaves (next page {page})"
            ),
            Self::NotALeaf {
                page,
                referenced_by: Some(from),
            } => write!(f, "Page {from} leads to Page {page}, which is not a leaf"),
            Self::NotALeaf {
                page,
                referenced_by: None,
            } => write!(f, "Page {page} is not a leaf"),
            Self::DescentLoop { page } => {
                write!(f, "Left-most descent revisited Page {page}")
            }
            Self::LeafChainMismatch {
                page,
                in_chain: false,
            } => write!(f, "Leaf Page {page} is in the tree but not in the leaf chain"),
            Self::LeafChainMismatch {
                page,
                in_chain: true,
            } => write!(f, "Leaf Page {page} is in the leaf chain but not in the tree"),
        }
    }
}

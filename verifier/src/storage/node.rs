//! B+Tree node bodies.
//!
//! Internal body (after the 8-byte header):
//! - `right_child`: 4 bytes
//! - cells: `cell_count` x 12 bytes (`key` i32, `row_id` i32, `child` u32)
//!
//! Leaf body (after the 8-byte header):
//! - `next_leaf`: 4 bytes (0 = end of chain)
//! - cells: `cell_count` x 8 bytes (`key` i32, `row_id` i32)
//!
//! Decoding never trusts `cell_count` past the end of the page: the number of
//! decoded cells is clamped to what physically fits.

use crate::storage::page::{NodeHeader, NodeKind, PAGE_SIZE, Page, PageId};

/// Offset of the right-child / next-leaf reference.
const LINK_OFFSET: usize = NodeHeader::SIZE;

/// Offset of the first cell in either node kind.
const CELLS_OFFSET: usize = LINK_OFFSET + 4;

/// Size of an internal cell: key + row id + child page.
pub const INTERNAL_CELL_SIZE: usize = 12;

/// Size of a leaf cell: key + row id.
pub const LEAF_CELL_SIZE: usize = 8;

/// Maximum number of cells that fit in an internal page.
pub const MAX_INTERNAL_CELLS: usize = (PAGE_SIZE - CELLS_OFFSET) / INTERNAL_CELL_SIZE;

/// Maximum number of cells that fit in a leaf page.
pub const MAX_LEAF_CELLS: usize = (PAGE_SIZE - CELLS_OFFSET) / LEAF_CELL_SIZE;

/// The end-of-chain marker stored in a leaf's `next_leaf`.
pub const END_OF_CHAIN: PageId = 0;

/// A cell of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternalCell {
    pub key: i32,
    pub row_id: i32,
    /// Subtree holding keys up to `key`.
    pub child: PageId,
}

/// A cell of a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafCell {
    pub key: i32,
    pub row_id: i32,
}

/// An internal (non-leaf) node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    pub header: NodeHeader,
    /// Subtree holding keys greater than every cell key.
    pub right_child: PageId,
    /// Cells in stored order.
    pub cells: Vec<InternalCell>,
}

impl InternalNode {
    /// Read an internal node body from a page.
    #[must_use]
    pub fn from_page(header: NodeHeader, page: &Page) -> Self {
        let count = usize::from(header.cell_count).min(MAX_INTERNAL_CELLS);
        let cells = (0..count)
            .map(|i| {
                let offset = CELLS_OFFSET + i * INTERNAL_CELL_SIZE;
                InternalCell {
                    key: page.read_i32(offset),
                    row_id: page.read_i32(offset + 4),
                    child: page.read_u32(offset + 8),
                }
            })
            .collect();

        Self {
            header,
            right_child: page.read_u32(LINK_OFFSET),
            cells,
        }
    }

    /// Write the node (header and body) to a page.
    pub fn write_to_page(&self, page: &mut Page) {
        self.header.write_to_page(page);
        page.write_u32(LINK_OFFSET, self.right_child);
        for (i, cell) in self.cells.iter().enumerate() {
            let offset = CELLS_OFFSET + i * INTERNAL_CELL_SIZE;
            page.write_i32(offset, cell.key);
            page.write_i32(offset + 4, cell.row_id);
            page.write_u32(offset + 8, cell.child);
        }
    }

    /// Child references in the order they are stored: the right child,
    /// then each cell's child.
    pub fn children(&self) -> impl Iterator<Item = PageId> + '_ {
        std::iter::once(self.right_child).chain(self.cells.iter().map(|cell| cell.child))
    }

    /// The left-most child: the first cell's child, or the right child for a
    /// node with no cells.
    #[must_use]
    pub fn leftmost_child(&self) -> PageId {
        self.cells
            .first()
            .map_or(self.right_child, |cell| cell.child)
    }
}

/// A leaf node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub header: NodeHeader,
    /// Next leaf in key order, or [`END_OF_CHAIN`].
    pub next_leaf: PageId,
    /// Cells in stored order.
    pub cells: Vec<LeafCell>,
}

impl LeafNode {
    /// Read a leaf node body from a page.
    #[must_use]
    pub fn from_page(header: NodeHeader, page: &Page) -> Self {
        let count = usize::from(header.cell_count).min(MAX_LEAF_CELLS);
        let cells = (0..count)
            .map(|i| {
                let offset = CELLS_OFFSET + i * LEAF_CELL_SIZE;
                LeafCell {
                    key: page.read_i32(offset),
                    row_id: page.read_i32(offset + 4),
                }
            })
            .collect();

        Self {
            header,
            next_leaf: page.read_u32(LINK_OFFSET),
            cells,
        }
    }

    /// Write the node (header and body) to a page.
    pub fn write_to_page(&self, page: &mut Page) {
        self.header.write_to_page(page);
        page.write_u32(LINK_OFFSET, self.next_leaf);
        for (i, cell) in self.cells.iter().enumerate() {
            let offset = CELLS_OFFSET + i * LEAF_CELL_SIZE;
            page.write_i32(offset, cell.key);
            page.write_i32(offset + 4, cell.row_id);
        }
    }

    /// Keys in stored order.
    pub fn keys(&self) -> impl Iterator<Item = i32> + '_ {
        self.cells.iter().map(|cell| cell.key)
    }
}

/// A decoded node of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Internal(InternalNode),
    Leaf(LeafNode),
}

impl Node {
    /// Decode the body of a page according to its header.
    pub fn decode(header: NodeHeader, page: &Page) -> Result<Self, NodeError> {
        match header.node_kind() {
            Ok(NodeKind::Internal) => Ok(Self::Internal(InternalNode::from_page(header, page))),
            Ok(NodeKind::Leaf) => Ok(Self::Leaf(LeafNode::from_page(header, page))),
            Err(kind) => Err(NodeError::UnknownKind(kind)),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Internal(_) => NodeKind::Internal,
            Self::Leaf(_) => NodeKind::Leaf,
        }
    }

    #[must_use]
    pub const fn header(&self) -> &NodeHeader {
        match self {
            Self::Internal(node) => &node.header,
            Self::Leaf(node) => &node.header,
        }
    }

    /// Maximum number of cells a page of this kind can hold.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        match self {
            Self::Internal(_) => MAX_INTERNAL_CELLS,
            Self::Leaf(_) => MAX_LEAF_CELLS,
        }
    }
}

/// Errors related to node decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeError {
    /// The kind byte is neither internal nor leaf.
    UnknownKind(u8),
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownKind(v) => write!(f, "unknown node kind: 0x{v:02x}"),
        }
    }
}

impl std::error::Error for NodeError {}

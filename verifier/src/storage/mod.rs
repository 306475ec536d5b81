//! Read-only access to B+Tree files.
//!
//! # File Format
//!
//! The file is a flat array of 4KB pages addressed by zero-based page number:
//!
//! - Page 0: the root node (internal or leaf)
//! - Remaining pages: internal and leaf nodes, in allocation order
//!
//! Every page begins with an 8-byte [`NodeHeader`]. All integers are
//! little-endian.
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//! use btree_verify::storage::{Node, PageReader};
//!
//! let mut reader = PageReader::open(Path::new("index.db"))?;
//! if let Some(root) = reader.read_page(0)? {
//!     let node = Node::decode(root.header, &root.page)?;
//!     println!("root is {}", node.kind());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod node;
mod page;
mod reader;

pub use node::{
    END_OF_CHAIN, INTERNAL_CELL_SIZE, InternalCell, InternalNode, LEAF_CELL_SIZE, LeafCell,
    LeafNode, MAX_INTERNAL_CELLS, MAX_LEAF_CELLS, Node, NodeError,
};
pub use page::{
    NO_PARENT, NodeHeader, NodeKind, PAGE_SIZE, PAGE_SIZE_U64, Page, PageId, ROOT_PAGE,
};
pub use reader::{LoadedPage, PageReader, ReadError};

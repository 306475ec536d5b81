//! Page types and constants for the verifier.
//!
//! The verified file is a flat array of 4KB pages. Every page starts with an
//! 8-byte node header; page 0 is always the root.

/// Page size in bytes (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Page size as u64 for offset calculations.
pub const PAGE_SIZE_U64: u64 = PAGE_SIZE as u64;

/// A page identifier (0-indexed page number).
///
/// On disk every page reference is a 4-byte unsigned integer.
pub type PageId = u32;

/// The root always lives on page 0.
pub const ROOT_PAGE: PageId = 0;

/// Parent value stored in the root's header.
pub const NO_PARENT: i32 = -1;

/// Node kind discriminant stored in the first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeKind {
    Internal = 0,
    Leaf = 1,
}

impl TryFrom<u8> for NodeKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Internal),
            1 => Ok(Self::Leaf),
            _ => Err(value),
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "INTERNAL"),
            Self::Leaf => write!(f, "LEAF"),
        }
    }
}

/// Header present at the start of every page.
///
/// Layout:
/// - `kind`: 1 byte (0 = internal, 1 = leaf)
/// - `is_root`: 1 byte
/// - `cell_count`: 2 bytes
/// - `parent`: 4 bytes (signed, -1 for the root)
///
/// Total: 8 bytes
///
/// Field ranges are not validated here. The raw kind byte is kept so that
/// an unknown kind can be reported with its actual value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub kind: u8,
    pub is_root: bool,
    pub cell_count: u16,
    pub parent: i32,
}

impl NodeHeader {
    /// Size of the node header in bytes.
    pub const SIZE: usize = 8;

    /// Decode the header at the start of a page.
    #[must_use]
    pub fn from_page(page: &Page) -> Self {
        Self {
            kind: page.read_u8(0),
            is_root: page.read_u8(1) != 0,
            cell_count: page.read_u16(2),
            parent: page.read_i32(4),
        }
    }

    /// Write the header to the start of a page.
    pub fn write_to_page(&self, page: &mut Page) {
        page.write_u8(0, self.kind);
        page.write_u8(1, u8::from(self.is_root));
        page.write_u16(2, self.cell_count);
        page.write_i32(4, self.parent);
    }

    /// The decoded node kind, or the raw byte if it is not a known kind.
    pub fn node_kind(&self) -> Result<NodeKind, u8> {
        NodeKind::try_from(self.kind)
    }
}

/// A raw page buffer.
pub struct Page {
    data: Box<[u8; PAGE_SIZE]>,
}

impl Page {
    /// Create a new zeroed page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; PAGE_SIZE]),
        }
    }

    /// Get the raw page data.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    /// Get mutable access to the raw page data.
    pub fn as_bytes_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    #[must_use]
    pub fn read_u8(&self, offset: usize) -> u8 {
        self.data[offset]
    }

    pub fn write_u8(&mut self, offset: usize, value: u8) {
        self.data[offset] = value;
    }

    /// Read a u16 (little-endian) at the given offset.
    #[must_use]
    pub fn read_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }

    /// Write a u16 (little-endian) at the given offset.
    pub fn write_u16(&mut self, offset: usize, value: u16) {
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    /// Read a u32 (little-endian) at the given offset.
    #[must_use]
    pub fn read_u32(&self, offset: usize) -> u32 {
        u32::from_le_bytes(self.word(offset))
    }

    /// Write a u32 (little-endian) at the given offset.
    pub fn write_u32(&mut self, offset: usize, value: u32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Read an i32 (little-endian) at the given offset.
    #[must_use]
    pub fn read_i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes(self.word(offset))
    }

    /// Write an i32 (little-endian) at the given offset.
    pub fn write_i32(&mut self, offset: usize, value: i32) {
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn word(&self, offset: usize) -> [u8; 4] {
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("header", &NodeHeader::from_page(self))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_header_roundtrip() {
        let header = NodeHeader {
            kind: NodeKind::Leaf as u8,
            is_root: false,
            cell_count: 3,
            parent: 7,
        };

        let mut page = Page::new();
        header.write_to_page(&mut page);
        let restored = NodeHeader::from_page(&page);

        assert_eq!(restored, header);
        assert_eq!(restored.node_kind(), Ok(NodeKind::Leaf));
    }

    #[test]
    fn test_header_byte_layout() {
        let mut page = Page::new();
        NodeHeader {
            kind: 0,
            is_root: true,
            cell_count: 0x0102,
            parent: NO_PARENT,
        }
        .write_to_page(&mut page);

        assert_eq!(
            &page.as_bytes()[..NodeHeader::SIZE],
            &[0x00, 0x01, 0x02, 0x01, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_unknown_kind_keeps_raw_byte() {
        let mut page = Page::new();
        page.write_u8(0, 0x7F);

        let header = NodeHeader::from_page(&page);
        assert_eq!(header.node_kind(), Err(0x7F));
    }

    #[test]
    fn test_page_read_write() {
        let mut page = Page::new();

        page.write_u16(10, 0xBEEF);
        assert_eq!(page.read_u16(10), 0xBEEF);

        page.write_u32(100, 0x1234_5678);
        assert_eq!(page.read_u32(100), 0x1234_5678);

        page.write_i32(200, -42);
        assert_eq!(page.read_i32(200), -42);
        assert_eq!(page.read_u32(200), 0xFFFF_FFD6);
    }
}

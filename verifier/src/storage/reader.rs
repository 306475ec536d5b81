//! Read-only page access to a B+Tree file.
//!
//! The reader maps a page number to a 4KB block and decodes its header.
//! Nothing is cached: every call seeks and reads again, so a page visited by
//! both the tree walk and the chain walk is read twice.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::storage::page::{NodeHeader, PAGE_SIZE_U64, Page, PageId};

/// Errors that can occur while reading pages.
#[derive(Debug)]
pub enum ReadError {
    /// The file could not be opened.
    Open { path: PathBuf, source: std::io::Error },
    /// I/O error while reading a page.
    Io {
        page_id: PageId,
        source: std::io::Error,
    },
    /// I/O error while determining the file length.
    Length(std::io::Error),
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => {
                write!(f, "unable to open {}: {source}", path.display())
            }
            Self::Io { page_id, source } => write!(f, "I/O error reading page {page_id}: {source}"),
            Self::Length(e) => write!(f, "I/O error determining file length: {e}"),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Io { source, .. } => Some(source),
            Self::Length(e) => Some(e),
        }
    }
}

/// A page read from the file together with its decoded header.
#[derive(Debug)]
pub struct LoadedPage {
    pub page_id: PageId,
    pub header: NodeHeader,
    pub page: Page,
}

/// Page-granular reader over any seekable byte source.
///
/// Production code reads from a [`File`]; tests read from in-memory cursors.
pub struct PageReader<R = File> {
    source: R,
    file_len: u64,
}

impl PageReader<File> {
    /// Open a file read-only.
    pub fn open(path: &Path) -> Result<Self, ReadError> {
        let file = File::open(path).map_err(|source| ReadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(file)
    }
}

impl<R: Read + Seek> PageReader<R> {
    /// Wrap a byte source. The length is sampled once; the source must not
    /// change for the lifetime of the reader.
    pub fn new(mut source: R) -> Result<Self, ReadError> {
        let file_len = source.seek(SeekFrom::End(0)).map_err(ReadError::Length)?;
        Ok(Self { source, file_len })
    }

    /// Length of the underlying source in bytes.
    #[must_use]
    pub const fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Number of complete pages in the source.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        self.file_len / PAGE_SIZE_U64
    }

    /// Bytes after the last complete page.
    #[must_use]
    pub const fn trailing_bytes(&self) -> u64 {
        self.file_len % PAGE_SIZE_U64
    }

    /// Read a page and decode its header.
    ///
    /// Returns `Ok(None)` when fewer than a full page of bytes exist at the
    /// page's offset. Header fields are returned as stored, unvalidated.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Option<LoadedPage>, ReadError> {
        if u64::from(page_id) >= self.total_pages() {
            return Ok(None);
        }

        let offset = u64::from(page_id) * PAGE_SIZE_U64;
        self.source
            .seek(SeekFrom::Start(offset))
            .map_err(|source| ReadError::Io { page_id, source })?;

        let mut page = Page::new();
        match self.source.read_exact(page.as_bytes_mut()) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(source) => return Err(ReadError::Io { page_id, source }),
        }

        let header = NodeHeader::from_page(&page);
        tracing::trace!(page_id, ?header, "read page");

        Ok(Some(LoadedPage {
            page_id,
            header,
            page,
        }))
    }
}

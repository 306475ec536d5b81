//! Test fixtures: build B+Tree files page by page.
//!
//! The builder writes whatever it is told, including corrupt headers and
//! links, so tests can describe a damaged file directly.

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::storage::{
    InternalCell, InternalNode, LeafCell, LeafNode, NO_PARENT, NodeHeader, NodeKind, Page, PageId,
    PageReader,
};

/// An in-memory B+Tree file.
#[derive(Default)]
pub struct TreeFile {
    pages: Vec<Page>,
}

impl TreeFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Page 0 internal with one cell (50 -> page 1) and right child 2; two
    /// leaves chained 1 -> 2 holding keys 10 and 60.
    #[must_use]
    pub fn two_leaf_scenario() -> Self {
        let mut file = Self::new();
        file.internal(0, NO_PARENT, 2, &[(50, 1)]);
        file.leaf(1, 0, 2, &[10]);
        file.leaf(2, 0, 0, &[60]);
        file
    }

    /// Mutable access to a page, growing the file with zeroed pages.
    pub fn page_mut(&mut self, page_id: PageId) -> &mut Page {
        let index = page_id as usize;
        if self.pages.len() <= index {
            self.pages.resize_with(index + 1, Page::new);
        }
        &mut self.pages[index]
    }

    /// Write an internal node. Cells are `(key, child)`; row ids are the
    /// cell positions.
    pub fn internal(
        &mut self,
        page_id: PageId,
        parent: i32,
        right_child: PageId,
        cells: &[(i32, PageId)],
    ) -> &mut Self {
        let node = InternalNode {
            header: header(NodeKind::Internal, page_id, cells.len(), parent),
            right_child,
            cells: cells
                .iter()
                .zip(0..)
                .map(|(&(key, child), row_id)| InternalCell { key, row_id, child })
                .collect(),
        };
        node.write_to_page(self.page_mut(page_id));
        self
    }

    /// Write a leaf node. Row ids are the key positions.
    pub fn leaf(&mut self, page_id: PageId, parent: i32, next_leaf: PageId, keys: &[i32]) -> &mut Self {
        let node = LeafNode {
            header: header(NodeKind::Leaf, page_id, keys.len(), parent),
            next_leaf,
            cells: keys
                .iter()
                .zip(0..)
                .map(|(&key, row_id)| LeafCell { key, row_id })
                .collect(),
        };
        node.write_to_page(self.page_mut(page_id));
        self
    }

    /// Overwrite the stored parent of a page.
    pub fn set_parent(&mut self, page_id: PageId, parent: i32) -> &mut Self {
        let page = self.page_mut(page_id);
        let mut hdr = NodeHeader::from_page(page);
        hdr.parent = parent;
        hdr.write_to_page(page);
        self
    }

    /// Overwrite the right child (internal) or next leaf (leaf) of a page.
    pub fn set_next(&mut self, page_id: PageId, target: PageId) -> &mut Self {
        self.page_mut(page_id).write_u32(NodeHeader::SIZE, target);
        self
    }

    /// The file contents.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.pages
            .iter()
            .flat_map(|page| page.as_bytes().iter().copied())
            .collect()
    }

    /// A reader over the file contents.
    #[must_use]
    pub fn reader(&self) -> PageReader<Cursor<Vec<u8>>> {
        match PageReader::new(Cursor::new(self.bytes())) {
            Ok(reader) => reader,
            Err(e) => panic!("in-memory reader: {e}"),
        }
    }

    /// Write the file to disk.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.bytes())
    }
}

fn header(kind: NodeKind, page_id: PageId, cells: usize, parent: i32) -> NodeHeader {
    NodeHeader {
        kind: kind as u8,
        is_root: page_id == 0,
        cell_count: u16::try_from(cells).unwrap_or(u16::MAX),
        parent,
    }
}

/// A randomly shaped, structurally valid tree.
pub struct RandomTree {
    pub file: TreeFile,
    /// All keys in ascending order, as the leaf chain must yield them.
    pub keys: Vec<i32>,
    pub leaf_count: usize,
}

/// Build a valid tree over `key_count` random keys (duplicates allowed).
///
/// Leaves hold 1..=`max_cells` keys and internal nodes reference up to
/// `max_fanout` children (at least 2, except the last node of a level).
/// Non-root pages get shuffled page numbers so the physical order has
/// nothing to do with the tree order.
pub fn random_tree<G: Rng>(
    rng: &mut G,
    key_count: usize,
    max_cells: usize,
    max_fanout: usize,
) -> RandomTree {
    let mut keys: Vec<i32> = (0..key_count.max(1))
        .map(|_| rng.random_range(-1000..1000))
        .collect();
    keys.sort_unstable();

    // Level 0: split the sorted keys into leaves.
    let mut leaf_keys: Vec<Vec<i32>> = Vec::new();
    let mut rest = keys.as_slice();
    while !rest.is_empty() {
        let take = rng.random_range(1..=max_cells).min(rest.len());
        leaf_keys.push(rest[..take].to_vec());
        rest = &rest[take..];
    }

    // Group each level under parents until one node is left. Every node is
    // (max key, children); leaves have no children.
    let mut levels: Vec<Vec<(i32, Vec<usize>)>> = vec![
        leaf_keys
            .iter()
            .map(|k| (*k.last().unwrap_or(&0), Vec::new()))
            .collect(),
    ];
    while levels.last().map_or(0, Vec::len) > 1 {
        let below = levels.last().map_or(0, Vec::len);
        let mut level = Vec::new();
        let mut start = 0;
        while start < below {
            let end = (start + rng.random_range(2..=max_fanout.max(2))).min(below);
            let children: Vec<usize> = (start..end).collect();
            let max_key = levels.last().map_or(0, |l| l[end - 1].0);
            level.push((max_key, children));
            start = end;
        }
        levels.push(level);
    }

    // Page numbers: the single top node is page 0, everything else gets a
    // shuffled number from 1.
    let node_count: usize = levels.iter().map(Vec::len).sum();
    let mut numbers: Vec<PageId> = (1..node_count).map(|n| n as PageId).collect();
    numbers.shuffle(rng);
    let mut numbers = numbers.into_iter();
    let top = levels.len() - 1;
    let page_ids: Vec<Vec<PageId>> = levels
        .iter()
        .enumerate()
        .map(|(depth, level)| {
            if depth == top {
                vec![0]
            } else {
                level.iter().map(|_| numbers.next().unwrap_or(0)).collect()
            }
        })
        .collect();

    // Parent of every node, by level.
    let mut parents: Vec<Vec<i32>> = levels.iter().map(|l| vec![NO_PARENT; l.len()]).collect();
    for depth in 1..levels.len() {
        for (index, (_, children)) in levels[depth].iter().enumerate() {
            for &child in children {
                parents[depth - 1][child] = page_ids[depth][index] as i32;
            }
        }
    }

    let mut file = TreeFile::new();
    let leaf_ids = &page_ids[0];
    for (index, cells) in leaf_keys.iter().enumerate() {
        let next = leaf_ids.get(index + 1).copied().unwrap_or(0);
        file.leaf(leaf_ids[index], parents[0][index], next, cells);
    }
    for depth in 1..levels.len() {
        for (index, (_, children)) in levels[depth].iter().enumerate() {
            let (last, firsts) = children.split_last().unwrap_or((&0, &[]));
            let cells: Vec<(i32, PageId)> = firsts
                .iter()
                .map(|&c| (levels[depth - 1][c].0, page_ids[depth - 1][c]))
                .collect();
            file.internal(
                page_ids[depth][index],
                parents[depth][index],
                page_ids[depth - 1][*last],
                &cells,
            );
        }
    }

    RandomTree {
        file,
        keys,
        leaf_count: leaf_keys.len(),
    }
}

/// Shared in-memory log sink.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a fmt subscriber using `filter` installed on this thread,
/// returning its result and everything that was logged.
pub fn capture_logs<T>(filter: &str, f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(buffer.clone())
        .with_ansi(false)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logged = buffer.0.lock().expect("log buffer").clone();
    (result, String::from_utf8_lossy(&logged).into_owned())
}

//! Breadth-first walk over parent/child links.
//!
//! The walk starts at the root and follows right-child and cell-child
//! references. Each child is claimed in an [`OwnershipMap`] by the node that
//! references it; the claim is what a node's stored parent is checked
//! against. Leaf `next` pointers are not followed here.
//!
//! Only the first claim on a page enqueues it, so the queue sees every page
//! at most once even when the links loop. Loops are found afterwards by a
//! depth-first pass over every child reference the walk saw, including the
//! rejected ones.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Seek};

use crate::storage::{
    InternalNode, LoadedPage, NO_PARENT, Node, NodeError, NodeHeader, PageId, PageReader,
    ROOT_PAGE, ReadError,
};
use crate::verify::ownership::{Claim, OwnershipMap};
use crate::verify::violation::Violation;

/// A node decoded during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitedNode {
    pub page_id: PageId,
    pub node: Node,
}

/// One step of the walk, in detection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEntry {
    Node(VisitedNode),
    Violation(Violation),
}

/// Everything the walk found.
#[derive(Debug, Default)]
pub struct WalkReport {
    pub entries: Vec<WalkEntry>,
    /// Leaves reached through child links, in visiting order.
    pub discovered_leaves: Vec<PageId>,
}

impl WalkReport {
    pub fn nodes(&self) -> impl Iterator<Item = &VisitedNode> {
        self.entries.iter().filter_map(|entry| match entry {
            WalkEntry::Node(node) => Some(node),
            WalkEntry::Violation(_) => None,
        })
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.entries.iter().filter_map(|entry| match entry {
            WalkEntry::Violation(v) => Some(v),
            WalkEntry::Node(_) => None,
        })
    }

    /// The decoded node for `page_id`, if the walk visited it.
    #[must_use]
    pub fn node(&self, page_id: PageId) -> Option<&Node> {
        self.nodes()
            .find(|visited| visited.page_id == page_id)
            .map(|visited| &visited.node)
    }
}

/// Depth-first state of a page; pages not yet reached have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Colour {
    /// On the current path from the root.
    Grey,
    /// Every descendant explored.
    Black,
}

/// Breadth-first tree walker.
pub struct TreeWalker<'a, R> {
    reader: &'a mut PageReader<R>,
    check_internal_order: bool,
    queue: VecDeque<PageId>,
    visited: usize,
    owners: OwnershipMap,
    /// Every in-bounds child reference, by referring page, in stored order.
    edges: HashMap<PageId, Vec<PageId>>,
    report: WalkReport,
}

impl<'a, R: Read + Seek> TreeWalker<'a, R> {
    pub fn new(reader: &'a mut PageReader<R>) -> Self {
        Self {
            reader,
            check_internal_order: false,
            queue: VecDeque::new(),
            visited: 0,
            owners: OwnershipMap::new(),
            edges: HashMap::new(),
            report: WalkReport::default(),
        }
    }

    /// Also report decreasing keys inside internal nodes.
    #[must_use]
    pub const fn check_internal_order(mut self, enabled: bool) -> Self {
        self.check_internal_order = enabled;
        self
    }

    /// Walk the whole tree from the root.
    ///
    /// Only I/O errors are returned; every structural problem ends up in the
    /// report. Each page is processed at most once, so the walk performs at
    /// most one read per page of the file.
    pub fn walk(mut self) -> Result<WalkReport, ReadError> {
        self.queue.push_back(ROOT_PAGE);

        while let Some(page_id) = self.queue.pop_front() {
            self.visited += 1;

            let Some(loaded) = self.reader.read_page(page_id)? else {
                let referenced_by = self.owners.owner(page_id);
                self.record(Violation::MissingPage {
                    page: page_id,
                    referenced_by,
                });
                continue;
            };

            self.visit(loaded);
        }

        self.find_cycles();

        tracing::debug!(
            visited = self.visited,
            owned = self.owners.len(),
            leaves = self.report.discovered_leaves.len(),
            "tree walk finished"
        );
        Ok(self.report)
    }

    fn visit(&mut self, loaded: LoadedPage) {
        let LoadedPage {
            page_id,
            header,
            page,
        } = loaded;

        let node = match Node::decode(header, &page) {
            Ok(node) => node,
            Err(NodeError::UnknownKind(kind)) => {
                self.record(Violation::UnknownKind {
                    page: page_id,
                    kind,
                });
                self.check_parent(page_id, &header);
                return;
            }
        };

        tracing::debug!(
            page = page_id,
            kind = %node.kind(),
            parent = header.parent,
            cells = header.cell_count,
            "visiting page"
        );
        self.report.entries.push(WalkEntry::Node(VisitedNode {
            page_id,
            node: node.clone(),
        }));

        self.check_parent(page_id, &header);

        if usize::from(header.cell_count) > node.capacity() {
            self.record(Violation::CellCountOverflow {
                page: page_id,
                declared: header.cell_count,
                capacity: node.capacity(),
            });
        }

        match &node {
            Node::Internal(internal) => {
                if self.check_internal_order {
                    self.check_key_order(page_id, internal);
                }
                self.claim_children(page_id, internal);
            }
            Node::Leaf(_) => self.report.discovered_leaves.push(page_id),
        }
    }

    fn check_parent(&mut self, page_id: PageId, header: &NodeHeader) {
        if page_id == ROOT_PAGE {
            // A freshly split root is written with parent 0 by the engine.
            if header.parent != NO_PARENT && header.parent != 0 {
                self.record(Violation::RootHeader {
                    parent: header.parent,
                });
            }
            return;
        }

        // Non-root pages are only enqueued after a granted claim, so this
        // arm is not reached by a walk from the root.
        match self.owners.owner(page_id) {
            None => self.record(Violation::Orphan {
                page: page_id,
                claimed: header.parent,
            }),
            Some(actual) if i32::try_from(actual).ok() != Some(header.parent) => {
                self.record(Violation::ParentPointer {
                    page: page_id,
                    claimed: header.parent,
                    actual,
                });
            }
            Some(_) => {}
        }
    }

    fn check_key_order(&mut self, page_id: PageId, node: &InternalNode) {
        for (index, pair) in node.cells.windows(2).enumerate() {
            if pair[1].key < pair[0].key {
                self.record(Violation::InternalKeyOrder {
                    page: page_id,
                    index: index + 1,
                    key: pair[1].key,
                    previous: pair[0].key,
                });
            }
        }
    }

    fn claim_children(&mut self, page_id: PageId, node: &InternalNode) {
        let total_pages = self.reader.total_pages();

        for child in node.children() {
            if u64::from(child) >= total_pages {
                self.record(Violation::MissingPage {
                    page: child,
                    referenced_by: Some(page_id),
                });
                continue;
            }

            self.edges.entry(page_id).or_default().push(child);

            // The root has no owner; a reference to it always closes a loop.
            if child == ROOT_PAGE {
                continue;
            }

            match self.owners.claim(child, page_id) {
                Claim::Granted => self.queue.push_back(child),
                Claim::Conflict { owner } => self.record(Violation::DoubleParent {
                    child,
                    owner,
                    claimant: page_id,
                }),
            }
        }
    }

    /// Report every child reference that points back at a page still on the
    /// depth-first path from the root.
    ///
    /// Each page turns grey once and each reference is followed once, so the
    /// pass is linear in the references recorded by the walk.
    fn find_cycles(&mut self) {
        let mut colours: HashMap<PageId, Colour> = HashMap::new();
        let mut stack: Vec<(PageId, usize)> = vec![(ROOT_PAGE, 0)];
        let mut cycles = Vec::new();
        colours.insert(ROOT_PAGE, Colour::Grey);

        while let Some((page, next)) = stack.last_mut() {
            let via = *page;
            let children = self.edges.get(&via).map_or(&[][..], Vec::as_slice);
            let Some(&child) = children.get(*next) else {
                colours.insert(via, Colour::Black);
                stack.pop();
                continue;
            };
            *next += 1;

            match colours.get(&child) {
                Some(Colour::Grey) => cycles.push(Violation::Cycle { page: child, via }),
                Some(Colour::Black) => {}
                None => {
                    colours.insert(child, Colour::Grey);
                    stack.push((child, 0));
                }
            }
        }

        for cycle in cycles {
            self.record(cycle);
        }
    }

    fn record(&mut self, violation: Violation) {
        tracing::debug!(kind = %violation.kind(), page = violation.page(), "{violation}");
        self.report.entries.push(WalkEntry::Violation(violation));
    }
}

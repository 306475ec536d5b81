//! The structural report and its text rendering.

use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Display, Formatter};

use crate::storage::{Node, NodeHeader, PageId};
use crate::verify::chain::ChainReport;
use crate::verify::violation::{Violation, ViolationKind};
use crate::verify::walker::{VisitedNode, WalkEntry, WalkReport};

/// Marker printed in front of every violation.
pub const CRITICAL: &str = ">>> CRITICAL ERROR:";

/// Findings of one verification run.
#[derive(Debug)]
pub struct Report {
    /// Complete pages in the file.
    pub total_pages: u64,
    /// Bytes after the last complete page.
    pub trailing_bytes: u64,
    /// Header of page 0 as stored.
    pub root: NodeHeader,
    pub walk: WalkReport,
    pub chain: ChainReport,
    /// Disagreements between the walk and the chain.
    pub cross_check: Vec<Violation>,
}

impl Report {
    /// Every violation: walk first, then chain, then cross-check.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.walk
            .violations()
            .chain(&self.chain.violations)
            .chain(&self.cross_check)
    }

    /// Whether no violation was recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations().next().is_none()
    }

    /// Number of violations of one kind.
    #[must_use]
    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations().filter(|v| v.kind() == kind).count()
    }

    /// Violations grouped by kind.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<ViolationKind, usize> {
        let mut counts = BTreeMap::new();
        for violation in self.violations() {
            *counts.entry(violation.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Render the report. With `quiet` set, node dumps and key lists are
    /// left out and only violations and the summary remain.
    #[must_use]
    pub const fn display(&self, quiet: bool) -> ReportDisplay<'_> {
        ReportDisplay {
            report: self,
            quiet,
        }
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.display(false).fmt(f)
    }
}

/// Text rendering of a [`Report`].
pub struct ReportDisplay<'a> {
    report: &'a Report,
    quiet: bool,
}

impl Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let report = self.report;

        if !self.quiet {
            let root = &report.root;
            writeln!(
                f,
                "ROOT: Page 0, Type: {}, IsRoot: {}, Parent: {}, Cells: {}",
                kind_name(root),
                u8::from(root.is_root),
                root.parent,
                root.cell_count
            )?;
        }

        for entry in &report.walk.entries {
            match entry {
                WalkEntry::Node(node) if !self.quiet => write_node(f, node)?,
                WalkEntry::Node(_) => {}
                WalkEntry::Violation(v) => writeln!(f, "  {CRITICAL} {v}")?,
            }
        }

        writeln!(f)?;
        writeln!(f, "Leaf chain:")?;
        let chain = &report.chain;
        match chain.leftmost_leaf {
            Some(page) => writeln!(f, "  Left-most leaf: {page}")?,
            None => writeln!(f, "  Left-most leaf: not found")?,
        }
        writeln!(f, "  Leaves visited: {}", chain.leaves_visited())?;
        if !self.quiet {
            writeln!(f, "  Order: {}", join(&chain.leaves))?;
            writeln!(f, "  Keys: {}", join(&chain.keys))?;
        }
        for v in &chain.violations {
            writeln!(f, "  {CRITICAL} {v}")?;
        }

        if !report.cross_check.is_empty() {
            writeln!(f)?;
            writeln!(f, "Cross-check:")?;
            for v in &report.cross_check {
                writeln!(f, "  {CRITICAL} {v}")?;
            }
        }

        writeln!(f)?;
        write_summary(f, report)
    }
}

fn write_node(f: &mut Formatter<'_>, visited: &VisitedNode) -> fmt::Result {
    let header = visited.node.header();
    writeln!(
        f,
        "[Page {}] Type: {}, Parent: {}, Cells: {}",
        visited.page_id,
        visited.node.kind(),
        header.parent,
        header.cell_count
    )?;
    match &visited.node {
        Node::Internal(node) => {
            writeln!(f, "  -> Right Child: {}", node.right_child)?;
            for cell in &node.cells {
                writeln!(f, "  -> Key: {}, Child: {}", cell.key, cell.child)?;
            }
        }
        Node::Leaf(node) => {
            writeln!(f, "  -> Next Leaf: {}", node.next_leaf)?;
            writeln!(f, "  Keys: {}", join(&node.keys().collect::<Vec<_>>()))?;
        }
    }
    Ok(())
}

fn write_summary(f: &mut Formatter<'_>, report: &Report) -> fmt::Result {
    let visited = report.walk.nodes().count();
    write!(
        f,
        "Summary: {} pages, {visited} nodes reachable, {} leaves in chain",
        report.total_pages,
        report.chain.leaves_visited()
    )?;
    if report.trailing_bytes > 0 {
        write!(f, ", {} trailing bytes ignored", report.trailing_bytes)?;
    }
    writeln!(f)?;

    let counts = report.counts();
    if counts.is_empty() {
        return writeln!(f, "No violations found.");
    }
    let total: usize = counts.values().sum();
    let breakdown: Vec<String> = counts
        .iter()
        .map(|(kind, n)| format!("{kind}: {n}"))
        .collect();
    writeln!(f, "{total} violations ({})", breakdown.join(", "))
}

fn kind_name(header: &NodeHeader) -> String {
    match header.node_kind() {
        Ok(kind) => kind.to_string(),
        Err(raw) => format!("UNKNOWN(0x{raw:02x})"),
    }
}

fn join<T: Display>(items: &[T]) -> String {
    let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// Leaves reached by only one of the two passes.
///
/// Only meaningful when the chain ran to its end marker; a broken chain is
/// already reported by the chain pass.
#[must_use]
pub fn cross_check(walk: &WalkReport, chain: &ChainReport) -> Vec<Violation> {
    if !chain.terminated {
        return Vec::new();
    }

    let chained: HashSet<PageId> = chain.leaves.iter().copied().collect();
    let discovered: HashSet<PageId> = walk.discovered_leaves.iter().copied().collect();

    let unchained = walk
        .discovered_leaves
        .iter()
        .filter(|page| !chained.contains(page))
        .map(|&page| Violation::LeafChainMismatch {
            page,
            in_chain: false,
        });
    let stray = chain
        .leaves
        .iter()
        .filter(|page| !discovered.contains(page))
        .map(|&page| Violation::LeafChainMismatch {
            page,
            in_chain: true,
        });

    unchained.chain(stray).collect()
}

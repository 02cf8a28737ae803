//! Data shapes produced by a resolution pass.

use crate::framework::Framework;
use crate::models::PackageIdentity;
use crate::report::{LogCode, LogMessage};
use crate::version::VersionRange;
use serde::Serialize;
use std::fmt;

/// Whether a graph node stands for a package or a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The root project or a referenced project
    Project,
    /// A package from the feed
    Package,
}

/// Lifecycle of a node within one pass.
///
/// ```text
/// Unvisited ──► Visiting ──► Resolved
///     │             │
///     └─────────────┴──────► Conflicted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// Created, version not yet decided
    Unvisited,
    /// Version decided, dependencies being expanded
    Visiting,
    /// Decided and fully expanded
    Resolved,
    /// No acceptable version, or a constraint it cannot honor
    Conflicted,
}

/// Whether an edge is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    /// Participates in resolution
    Active,
    /// Points back at an ancestor; not descended into or enforced
    CycleBroken,
}

/// Whether an edge was declared by the root project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Declared by the root project
    Direct,
    /// Declared by a package or a referenced project
    Transitive,
}

/// One version requirement arriving at a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    /// Acceptable versions
    pub range: VersionRange,
    /// Display name of the requesting node
    pub source: String,
    /// Index of the edge that carried it
    pub edge: usize,
    /// Declared by the root project
    pub direct: bool,
    /// Written as a bare version, meaning "exactly this one if available"
    pub pinned: bool,
}

/// A node in the pass arena.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    /// Package id or project name, as first seen
    pub id: String,
    /// Package or project
    pub kind: NodeKind,
    /// Lifecycle state
    pub state: NodeState,
    /// Distance from the root project
    pub depth: usize,
    /// Node that first introduced this one
    pub parent: Option<usize>,
    /// Every constraint that reached the node, in arrival order
    pub requested: Vec<Constraint>,
    /// Chosen identity, for decided package nodes
    pub resolved: Option<PackageIdentity>,
    /// Outgoing edge indices in declaration order
    pub children: Vec<usize>,
}

impl GraphNode {
    /// Display name used in messages: `id version` once decided, else `id`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.resolved
            .as_ref()
            .map_or_else(|| self.id.clone(), ToString::to_string)
    }

    /// Whether any constraint on this node came from the root project.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.requested.iter().any(|c| c.direct)
    }
}

/// An arena edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    /// Source node index
    pub from: usize,
    /// Target node index
    pub to: usize,
    /// Declared range; `all()` for project references
    pub range: VersionRange,
    /// Walk status
    pub status: EdgeStatus,
    /// Direct or transitive
    pub kind: EdgeKind,
}

/// A requirement that could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionConflict {
    /// Package or project id
    pub package_id: String,
    /// NU1101, NU1102, NU1107, NU1201 or NU1605
    pub code: LogCode,
    /// Competing `(source, range)` pairs, in arrival order
    pub competing: Vec<(String, VersionRange)>,
    /// Human-readable description
    pub message: String,
}

/// An edge that closed a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleAnnotation {
    /// Id the cycle returns to
    pub package_id: String,
    /// Ids from the repeated ancestor down to the closing edge, e.g. `A, B, A`
    pub path: Vec<String>,
}

impl fmt::Display for CycleAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join(" -> "))
    }
}

/// An edge pointing at a resolved package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomingEdge {
    /// Display name of the source node
    pub from: String,
    /// Declared range
    pub range: VersionRange,
    /// Walk status
    pub status: EdgeStatus,
    /// Direct or transitive
    pub kind: EdgeKind,
}

/// One package in the flattened output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPackage {
    /// Chosen identity
    pub identity: PackageIdentity,
    /// Depth at which the package was decided
    pub depth: usize,
    /// Referenced directly by the root project
    pub direct: bool,
    /// Whether a conflict was recorded against this package
    pub conflicted: bool,
    /// Edges that pointed at it, in creation order
    pub incoming: Vec<IncomingEdge>,
}

/// Whether a pass completed cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassOutcome {
    /// Zero conflicts
    Success,
    /// Resolved where possible; see `conflicts`
    Partial,
}

/// The result of resolving one target framework.
#[derive(Debug, Clone, Serialize)]
pub struct FrameworkResolution {
    /// Target framework of the pass
    pub framework: Framework,
    /// Decided packages, sorted by id then version
    pub packages: Vec<ResolvedPackage>,
    /// Conflicts in discovery order
    pub conflicts: Vec<ResolutionConflict>,
    /// Cycle-closing edges in discovery order
    pub cycles: Vec<CycleAnnotation>,
    /// Warnings and conflict errors in discovery order
    pub messages: Vec<LogMessage>,
    /// Success or partial
    pub outcome: PassOutcome,
    /// Arena nodes; index 0 is the root project
    pub nodes: Vec<GraphNode>,
    /// Arena edges
    pub edges: Vec<GraphEdge>,
}

impl FrameworkResolution {
    /// The resolved package with `id`, compared case-insensitively.
    #[must_use]
    pub fn package(&self, id: &str) -> Option<&ResolvedPackage> {
        self.packages
            .iter()
            .find(|p| p.identity.id.eq_ignore_ascii_case(id))
    }

    /// Conflicts recorded against `id`.
    pub fn conflicts_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a ResolutionConflict> + 'a {
        self.conflicts
            .iter()
            .filter(move |c| c.package_id.eq_ignore_ascii_case(id))
    }

    /// Whether the pass finished without conflicts.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == PassOutcome::Success
    }
}

//! Graph view over a finished resolution pass.
//!
//! [`ResolvedGraph`] loads the pass arena into a `petgraph` graph to answer
//! questions the flat package list cannot: installation order, transitive
//! closure, and a printable tree.

use super::types::{EdgeStatus, FrameworkResolution, NodeKind, NodeState};
use crate::models::PackageIdentity;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};
use std::fmt;

/// A node of the resolved graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphLabel {
    /// Package id or project name
    pub id: String,
    /// Package or project
    pub kind: NodeKind,
    /// Chosen identity for decided packages
    pub identity: Option<PackageIdentity>,
    /// Final node state
    pub state: NodeState,
}

impl GraphLabel {
    /// Name shown in trees: `id version` for decided packages.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.identity
            .as_ref()
            .map_or_else(|| self.id.clone(), ToString::to_string)
    }
}

impl fmt::Display for GraphLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// The dependency graph of one framework pass.
///
/// Node indices equal arena indices, so index 0 is the root project.
pub struct ResolvedGraph {
    graph: DiGraph<GraphLabel, EdgeStatus>,
}

impl ResolvedGraph {
    /// Builds the graph from a pass result. Repeated edges between the same
    /// pair of nodes are collapsed.
    #[must_use]
    pub fn from_resolution(resolution: &FrameworkResolution) -> Self {
        let mut graph = DiGraph::new();
        for node in &resolution.nodes {
            graph.add_node(GraphLabel {
                id: node.id.clone(),
                kind: node.kind,
                identity: node.resolved.clone(),
                state: node.state,
            });
        }
        for edge in &resolution.edges {
            let (from, to) = (NodeIndex::new(edge.from), NodeIndex::new(edge.to));
            if !graph.contains_edge(from, to) {
                graph.add_edge(from, to, edge.status);
            }
        }
        Self { graph }
    }

    fn find(&self, id: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&index| self.graph[index].id.eq_ignore_ascii_case(id))
    }

    /// Outgoing edges in declaration order.
    fn ordered_edges(&self, node: NodeIndex) -> Vec<EdgeReference<'_, EdgeStatus>> {
        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.sort_by_key(|edge| edge.id());
        edges
    }

    /// Decided packages ordered so every dependency precedes its dependents.
    ///
    /// Cycle-broken edges are ignored. Packages that still form a cycle through
    /// active edges are emitted together in arena order.
    #[must_use]
    pub fn install_order(&self) -> Vec<PackageIdentity> {
        let active = self.graph.filter_map(
            |_, label| Some(label.clone()),
            |_, status| (*status == EdgeStatus::Active).then_some(*status),
        );
        tarjan_scc(&active)
            .into_iter()
            .flat_map(|mut component| {
                component.sort();
                component
            })
            .filter_map(|index| active[index].identity.clone())
            .collect()
    }

    /// Ids of the nodes `id` points at directly, in declaration order.
    #[must_use]
    pub fn get_direct_deps(&self, id: &str) -> Vec<String> {
        self.find(id)
            .map(|index| {
                self.ordered_edges(index)
                    .into_iter()
                    .map(|edge| self.graph[edge.target()].id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids reachable from `id` over active edges.
    #[must_use]
    pub fn get_transitive_deps(&self, id: &str) -> HashSet<String> {
        let mut deps = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = self.find(id).into_iter().collect();
        while let Some(current) = queue.pop_front() {
            for edge in self.graph.edges(current) {
                if *edge.weight() == EdgeStatus::Active
                    && deps.insert(self.graph[edge.target()].id.to_ascii_lowercase())
                {
                    queue.push_back(edge.target());
                }
            }
        }
        deps
    }

    /// Number of nodes, including projects.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Tree rendering rooted at the root project.
    ///
    /// Cycle-broken edges are shown as `(circular reference)`; a node reached
    /// again through another path is listed with `(*)` and not expanded twice.
    #[must_use]
    pub fn to_tree_string(&self) -> String {
        let mut result = String::new();
        if self.graph.node_count() == 0 {
            return result;
        }
        let root = NodeIndex::new(0);
        result.push_str(&format!("{}\n", self.graph[root]));
        let mut expanded = HashSet::from([root]);
        let edges = self.ordered_edges(root);
        for (i, edge) in edges.iter().enumerate() {
            self.build_tree_string(*edge, &mut result, "", i + 1 == edges.len(), &mut expanded);
        }
        result
    }

    fn build_tree_string(
        &self,
        edge: EdgeReference<'_, EdgeStatus>,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        expanded: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let node = edge.target();
        let label = &self.graph[node];
        let marker = match label.state {
            NodeState::Conflicted => " [conflict]",
            _ => "",
        };

        if *edge.weight() == EdgeStatus::CycleBroken {
            result.push_str(&format!("{prefix}{connector}{label} (circular reference)\n"));
            return;
        }
        if !expanded.insert(node) {
            result.push_str(&format!("{prefix}{connector}{label}{marker} (*)\n"));
            return;
        }
        result.push_str(&format!("{prefix}{connector}{label}{marker}\n"));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        let edges = self.ordered_edges(node);
        for (i, child) in edges.iter().enumerate() {
            self.build_tree_string(*child, result, &child_prefix, i + 1 == edges.len(), expanded);
        }
    }
}

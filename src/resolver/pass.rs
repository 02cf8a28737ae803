//! One resolution pass for one target framework.
//!
//! # Algorithm
//!
//! Nodes live in an arena indexed by creation order, with one node per package
//! id (and one per project name). The walk is level-synchronous:
//!
//! 1. The root project is expanded; its references become depth-1 nodes.
//! 2. For each depth, every unvisited package node is decided from the
//!    intersection of the constraints that reached it at that depth. Version
//!    lists are fetched in node order with bounded concurrency.
//! 3. Decided packages have their dependency groups fetched the same way; the
//!    group nearest to the pass framework is expanded into depth+1 edges.
//!    Referenced projects are expanded from the request.
//! 4. An edge to an id that already has a node is attached to that node. If the
//!    node already reaches the edge's source through active edges, the edge
//!    closes a cycle and is marked [`EdgeStatus::CycleBroken`]. If the node was
//!    decided at a shallower depth, the new constraint is checked against the
//!    decided version.
//!
//! # Narrowing
//!
//! A transitive winner rejected by a deeper constraint is not a conflict while
//! some available version satisfies every range that reached it. The pass then
//! records that intersection as a narrowed range for the id and walks the graph
//! again from the root, deciding the id within it. Walks repeat until no range
//! narrows, at most `MAX_WALKS` times; the last walk reports NU1107 instead.
//!
//! # Late Constraint Checks
//!
//! | Decided version vs. new range | Direct winner | Transitive winner |
//! |-------------------------------|---------------|-------------------|
//! | satisfies (or differs only by prerelease) | accepted | accepted |
//! | below the lower bound | NU1605 conflict | narrowed, else NU1107 conflict |
//! | above the upper bound | NU1608 warning | narrowed, else NU1107 conflict |
//!
//! Every conflict on one node is merged into a single [`ResolutionConflict`].

use super::ResolveError;
use super::request::{ProjectRequest, RequestedDependency, ResolutionRequest};
use super::types::{
    Constraint, CycleAnnotation, EdgeKind, EdgeStatus, FrameworkResolution, GraphEdge, GraphNode,
    IncomingEdge, NodeKind, NodeState, PassOutcome, ResolutionConflict, ResolvedPackage,
};
use crate::framework::{CompatibilityTable, Framework};
use crate::models::{PackageIdentity, nearest_group};
use crate::provider::{DependencyInfo, PackageMetadataProvider, ProviderError};
use crate::report::codes::{NU1101, NU1102, NU1107, NU1201, NU1603, NU1605, NU1608};
use crate::report::{LogCode, LogMessage};
use crate::version::{NuGetVersion, VersionRange};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Walks of one pass before remaining late constraints are reported as conflicts.
const MAX_WALKS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Project(String),
    Package(String),
}

/// Runs a provider call unless cancelled, racing it against the token.
async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    if cancel.is_cancelled() {
        return Err(ProviderError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ProviderError::Cancelled),
        result = call => result,
    }
}

fn protocol_error(source_name: &str, package_id: &str, cause: ProviderError) -> ResolveError {
    match cause {
        ProviderError::Cancelled => ResolveError::Cancelled,
        cause => ResolveError::Protocol {
            source_name: source_name.to_string(),
            package_id: package_id.to_string(),
            cause,
        },
    }
}

/// State of one pass.
pub(crate) struct ResolutionPass<'a> {
    provider: &'a dyn PackageMetadataProvider,
    table: &'a CompatibilityTable,
    request: &'a ResolutionRequest,
    framework: Framework,
    max_concurrency: usize,
    cancel: &'a CancellationToken,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<NodeKey, usize>,
    conflicts: Vec<ResolutionConflict>,
    conflict_by_node: HashMap<usize, usize>,
    cycles: Vec<CycleAnnotation>,
    messages: Vec<LogMessage>,
    available: HashMap<usize, Vec<NuGetVersion>>,
    /// Narrowed ranges by lowercase id, applied when deciding
    narrowed: BTreeMap<String, VersionRange>,
    /// Ranges found during the current walk for the next one
    pending: BTreeMap<String, VersionRange>,
    allow_narrowing: bool,
}

impl<'a> ResolutionPass<'a> {
    pub(crate) fn new(
        provider: &'a dyn PackageMetadataProvider,
        table: &'a CompatibilityTable,
        request: &'a ResolutionRequest,
        framework: Framework,
        max_concurrency: usize,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            provider,
            table,
            request,
            framework,
            max_concurrency: max_concurrency.max(1),
            cancel,
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
            conflicts: Vec::new(),
            conflict_by_node: HashMap::new(),
            cycles: Vec::new(),
            messages: Vec::new(),
            available: HashMap::new(),
            narrowed: BTreeMap::new(),
            pending: BTreeMap::new(),
            allow_narrowing: true,
        }
    }

    pub(crate) async fn run(mut self) -> Result<FrameworkResolution, ResolveError> {
        debug!("Resolving {} for {}", self.request.root.name, self.framework);
        for walk in 1..=MAX_WALKS {
            self.allow_narrowing = walk < MAX_WALKS;
            self.walk().await?;
            if self.pending.is_empty() {
                break;
            }
            let ids: Vec<&str> = self.pending.keys().map(String::as_str).collect();
            debug!("Walking {} again with narrowed ranges for {}", self.framework, ids.join(", "));
            let pending = std::mem::take(&mut self.pending);
            self.narrowed.extend(pending);
        }
        Ok(self.finish())
    }

    fn reset(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.index.clear();
        self.conflicts.clear();
        self.conflict_by_node.clear();
        self.cycles.clear();
        self.messages.clear();
        self.available.clear();
        self.pending.clear();
    }

    /// One breadth-first walk from the root project.
    async fn walk(&mut self) -> Result<(), ResolveError> {
        self.reset();
        let request = self.request;
        let root = &request.root;
        self.nodes.push(GraphNode {
            id: root.name.clone(),
            kind: NodeKind::Project,
            state: NodeState::Visiting,
            depth: 0,
            parent: None,
            requested: Vec::new(),
            resolved: None,
            children: Vec::new(),
        });
        self.index
            .insert(NodeKey::Project(root.name.to_ascii_lowercase()), 0);
        let framework = self.framework.clone();
        self.expand_project(0, root, &framework);
        self.nodes[0].state = NodeState::Resolved;

        let mut depth = 1;
        loop {
            let level: Vec<usize> = (0..self.nodes.len())
                .filter(|&i| self.nodes[i].depth == depth && self.nodes[i].state == NodeState::Unvisited)
                .collect();
            if level.is_empty() {
                break;
            }
            trace!("Depth {depth}: {} node(s)", level.len());

            self.decide_level(&level).await?;
            self.expand_level(&level).await?;
            depth += 1;
        }
        Ok(())
    }

    fn node_name(&self, index: usize) -> String {
        self.nodes[index].display_name()
    }

    /// Shortest path from `start` to `goal` over active edges, both included.
    fn active_path(&self, start: usize, goal: usize) -> Option<Vec<usize>> {
        let mut previous: HashMap<usize, usize> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        previous.insert(start, start);
        while let Some(index) = queue.pop_front() {
            if index == goal {
                let mut path = vec![goal];
                let mut current = goal;
                while current != start {
                    current = previous[&current];
                    path.push(current);
                }
                path.reverse();
                return Some(path);
            }
            for &edge in &self.nodes[index].children {
                let edge = &self.edges[edge];
                if edge.status == EdgeStatus::Active && !previous.contains_key(&edge.to) {
                    previous.insert(edge.to, index);
                    queue.push_back(edge.to);
                }
            }
        }
        None
    }

    /// Adds an edge from `from` to the node for `key`, creating the node when new.
    fn add_edge(
        &mut self,
        from: usize,
        key: NodeKey,
        id: &str,
        kind: NodeKind,
        range: VersionRange,
        pinned: bool,
    ) {
        let depth = self.nodes[from].depth + 1;
        let edge_kind = if from == 0 {
            EdgeKind::Direct
        } else {
            EdgeKind::Transitive
        };
        let edge = self.edges.len();
        let constraint = Constraint {
            range: range.clone(),
            source: self.node_name(from),
            edge,
            direct: edge_kind == EdgeKind::Direct,
            pinned,
        };

        let Some(&target) = self.index.get(&key) else {
            let target = self.nodes.len();
            self.nodes.push(GraphNode {
                id: id.to_string(),
                kind,
                state: NodeState::Unvisited,
                depth,
                parent: Some(from),
                requested: vec![constraint],
                resolved: None,
                children: Vec::new(),
            });
            self.index.insert(key, target);
            self.push_edge(from, target, range, EdgeStatus::Active, edge_kind);
            return;
        };

        if let Some(path) = self.active_path(target, from) {
            let mut path: Vec<String> = path.into_iter().map(|i| self.nodes[i].id.clone()).collect();
            path.push(self.nodes[target].id.clone());
            let annotation = CycleAnnotation {
                package_id: self.nodes[target].id.clone(),
                path,
            };
            debug!("Breaking cycle {annotation}");
            self.cycles.push(annotation);
            self.push_edge(from, target, range, EdgeStatus::CycleBroken, edge_kind);
            return;
        }

        self.push_edge(from, target, range, EdgeStatus::Active, edge_kind);
        let node = &mut self.nodes[target];
        let late = node.depth < depth || node.state != NodeState::Unvisited;
        node.requested.push(constraint.clone());
        if late && node.kind == NodeKind::Package {
            self.check_late_constraint(target, &constraint);
        }
    }

    fn push_edge(&mut self, from: usize, to: usize, range: VersionRange, status: EdgeStatus, kind: EdgeKind) {
        let index = self.edges.len();
        self.edges.push(GraphEdge {
            from,
            to,
            range,
            status,
            kind,
        });
        self.nodes[from].children.push(index);
    }

    fn expand_project(&mut self, index: usize, project: &ProjectRequest, framework: &Framework) {
        for dependency in project.dependencies.iter().filter(|d| d.applies_to(framework)) {
            match dependency {
                RequestedDependency::Package {
                    id, range, pinned, ..
                } => self.add_edge(
                    index,
                    NodeKey::Package(id.to_ascii_lowercase()),
                    id,
                    NodeKind::Package,
                    range.clone(),
                    *pinned,
                ),
                RequestedDependency::Project { name, .. } => self.add_edge(
                    index,
                    NodeKey::Project(name.to_ascii_lowercase()),
                    name,
                    NodeKind::Project,
                    VersionRange::all(),
                    false,
                ),
            }
        }
    }

    /// Records a conflict, merging into an existing entry for the same node.
    fn record_conflict(&mut self, node: usize, code: LogCode, competing: Vec<(String, VersionRange)>, message: String) {
        self.nodes[node].state = NodeState::Conflicted;
        if let Some(&existing) = self.conflict_by_node.get(&node) {
            let conflict = &mut self.conflicts[existing];
            for entry in competing {
                if !conflict.competing.contains(&entry) {
                    conflict.competing.push(entry);
                }
            }
            conflict.message = conflict_message(&self.nodes[node].id, &conflict.code, &conflict.competing, &message);
            return;
        }
        let id = self.nodes[node].id.clone();
        self.conflict_by_node.insert(node, self.conflicts.len());
        self.conflicts.push(ResolutionConflict {
            package_id: id,
            code,
            competing,
            message,
        });
    }

    fn competing(&self, node: usize) -> Vec<(String, VersionRange)> {
        self.nodes[node]
            .requested
            .iter()
            .map(|c| (c.source.clone(), c.range.clone()))
            .collect()
    }

    fn check_late_constraint(&mut self, target: usize, constraint: &Constraint) {
        let Some(identity) = self.nodes[target].resolved.clone() else {
            return;
        };
        let version = &identity.version;
        let range = &constraint.range;
        if range.satisfies(version) || range.contains_bounds(version) {
            return;
        }

        let direct_winner = self.nodes[target].is_direct();
        let id = identity.id.clone();
        if range.is_below_lower_bound(version) && direct_winner {
            let minimum = range.min_version().map(ToString::to_string).unwrap_or_default();
            let message = format!(
                "Detected package downgrade: {id} from {minimum} to {version}. {} requires {id} ({}) but the project references {id} {version} directly",
                constraint.source,
                range.pretty()
            );
            self.record_conflict(target, NU1605, self.competing(target), message);
        } else if range.is_above_upper_bound(version) && direct_winner {
            let message = format!(
                "Detected package version outside of dependency constraint: {} requires {id} ({}) but version {id} {version} was resolved",
                constraint.source,
                range.pretty()
            );
            self.messages.push(
                LogMessage::warning(NU1608, message)
                    .with_framework(self.framework.to_string())
                    .with_package(id),
            );
        } else if !direct_winner && self.narrow(target) {
            trace!("Narrowing {id} after {} requires ({})", constraint.source, range.pretty());
        } else {
            let competing = self.competing(target);
            let message = conflict_message(&id, &NU1107, &competing, "");
            self.record_conflict(target, NU1107, competing, message);
        }
    }

    /// Records the intersection of every range that reached `target` for the
    /// next walk when an available version satisfies it.
    fn narrow(&mut self, target: usize) -> bool {
        if !self.allow_narrowing {
            return false;
        }
        let node = &self.nodes[target];
        let Some(range) = node
            .requested
            .iter()
            .try_fold(VersionRange::all(), |acc, c| acc.intersect(&c.range))
        else {
            return false;
        };
        let satisfiable = self
            .available
            .get(&target)
            .is_some_and(|versions| range.find_best_match(versions).is_some());
        let key = node.id.to_ascii_lowercase();
        if !satisfiable || self.narrowed.get(&key) == Some(&range) {
            self.pending.remove(&key);
            return false;
        }
        self.pending.insert(key, range);
        true
    }

    async fn decide_level(&mut self, level: &[usize]) -> Result<(), ResolveError> {
        let provider = self.provider;
        let cancel = self.cancel;
        let packages: Vec<(usize, String)> = level
            .iter()
            .filter(|&&i| self.nodes[i].kind == NodeKind::Package)
            .map(|&i| (i, self.nodes[i].id.clone()))
            .collect();

        let fetched: Vec<(usize, Result<Vec<NuGetVersion>, ProviderError>)> = stream::iter(packages)
            .map(|(index, id)| async move {
                trace!("Listing versions of {id}");
                (index, guarded(cancel, provider.get_all_versions(&id, cancel)).await)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        for (index, result) in fetched {
            let versions = result.map_err(|cause| {
                protocol_error(provider.source_name(), &self.nodes[index].id, cause)
            })?;
            self.decide(index, versions);
        }
        Ok(())
    }

    fn decide(&mut self, index: usize, mut versions: Vec<NuGetVersion>) {
        versions.sort();
        versions.dedup();
        let id = self.nodes[index].id.clone();
        let competing = self.competing(index);

        let intersection = self.nodes[index]
            .requested
            .iter()
            .try_fold(VersionRange::all(), |acc, c| acc.intersect(&c.range));
        let Some(range) = intersection else {
            let message = conflict_message(&id, &NU1107, &competing, "");
            self.record_conflict(index, NU1107, competing, message);
            return;
        };
        let range = self
            .narrowed
            .get(&id.to_ascii_lowercase())
            .and_then(|narrowed| range.intersect(narrowed))
            .filter(|narrowed| narrowed.find_best_match(&versions).is_some())
            .unwrap_or(range);

        if versions.is_empty() {
            let message = format!(
                "Unable to find package {id}. No packages exist with this id in source(s): {}",
                self.provider.source_name()
            );
            self.record_conflict(index, NU1101, competing, message);
            return;
        }

        let pinned = self.nodes[index]
            .requested
            .iter()
            .find(|c| c.pinned && c.direct)
            .and_then(|c| c.range.min_version().cloned());
        let chosen = match &pinned {
            Some(wanted) if versions.contains(wanted) && range.satisfies(wanted) => Some(wanted.clone()),
            Some(wanted) => {
                let lowest = range.find_lowest_match(&versions).cloned();
                if let Some(found) = &lowest {
                    self.messages.push(
                        LogMessage::warning(
                            NU1603,
                            format!(
                                "{id} {wanted} was not found. An approximate best match of {id} {found} was resolved"
                            ),
                        )
                        .with_framework(self.framework.to_string())
                        .with_package(id.clone()),
                    );
                }
                lowest
            }
            None => range.find_best_match(&versions).cloned(),
        };

        let Some(version) = chosen else {
            let listed: Vec<String> = versions.iter().map(ToString::to_string).collect();
            let message = format!(
                "Unable to find package {id} with version ({}). Found {} version(s) in {} [ {} ]",
                range.pretty(),
                versions.len(),
                self.provider.source_name(),
                listed.join(", ")
            );
            self.record_conflict(index, NU1102, competing, message);
            return;
        };

        trace!("Decided {id} {version}");
        self.available.insert(index, versions);
        let node = &mut self.nodes[index];
        node.resolved = Some(PackageIdentity::new(id, version));
        node.state = NodeState::Visiting;
    }

    async fn expand_level(&mut self, level: &[usize]) -> Result<(), ResolveError> {
        let provider = self.provider;
        let cancel = self.cancel;
        let decided: Vec<(usize, PackageIdentity)> = level
            .iter()
            .filter_map(|&i| match (&self.nodes[i].kind, &self.nodes[i].resolved) {
                (NodeKind::Package, Some(identity)) => Some((i, identity.clone())),
                _ => None,
            })
            .collect();

        let fetched: Vec<(usize, Result<DependencyInfo, ProviderError>)> = stream::iter(decided)
            .map(|(index, identity)| async move {
                trace!("Fetching dependencies of {identity}");
                let result = guarded(
                    cancel,
                    provider.get_dependency_info(&identity.id, &identity.version, cancel),
                )
                .await;
                (index, result)
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;
        let mut infos: HashMap<usize, DependencyInfo> = HashMap::new();
        for (index, result) in fetched {
            let info = result.map_err(|cause| {
                protocol_error(provider.source_name(), &self.nodes[index].id, cause)
            })?;
            infos.insert(index, info);
        }

        let framework = self.framework.clone();
        for &index in level {
            match self.nodes[index].kind {
                NodeKind::Project => self.expand_referenced_project(index),
                NodeKind::Package => {
                    let Some(info) = infos.remove(&index) else {
                        continue;
                    };
                    let dependencies = nearest_group(&info.groups, &framework, self.table)
                        .map(|group| group.dependencies.clone())
                        .unwrap_or_default();
                    for dependency in dependencies {
                        self.add_edge(
                            index,
                            NodeKey::Package(dependency.id.to_ascii_lowercase()),
                            &dependency.id,
                            NodeKind::Package,
                            dependency.range,
                            false,
                        );
                    }
                    if self.nodes[index].state == NodeState::Visiting {
                        self.nodes[index].state = NodeState::Resolved;
                    }
                }
            }
        }
        Ok(())
    }

    fn expand_referenced_project(&mut self, index: usize) {
        let request = self.request;
        let name = self.nodes[index].id.clone();
        let Some(project) = request.project(&name) else {
            return;
        };
        self.nodes[index].state = NodeState::Visiting;

        let framework = if project.frameworks.is_empty() {
            Some(self.framework.clone())
        } else {
            self.table
                .get_nearest(&self.framework, &project.frameworks)
                .cloned()
        };
        let Some(framework) = framework else {
            let supported: Vec<String> = project.frameworks.iter().map(ToString::to_string).collect();
            let message = format!(
                "Project {name} is not compatible with {}. Project {name} supports: {}",
                self.framework,
                supported.join(", ")
            );
            let competing = self.competing(index);
            self.record_conflict(index, NU1201, competing, message);
            return;
        };

        self.expand_project(index, project, &framework);
        if self.nodes[index].state == NodeState::Visiting {
            self.nodes[index].state = NodeState::Resolved;
        }
    }

    fn finish(self) -> FrameworkResolution {
        let framework_name = self.framework.to_string();
        let mut packages: Vec<ResolvedPackage> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let identity = node.resolved.clone()?;
                let incoming = self
                    .edges
                    .iter()
                    .filter(|edge| edge.to == index)
                    .map(|edge| IncomingEdge {
                        from: self.nodes[edge.from].display_name(),
                        range: edge.range.clone(),
                        status: edge.status,
                        kind: edge.kind,
                    })
                    .collect();
                Some(ResolvedPackage {
                    identity,
                    depth: node.depth,
                    direct: node.is_direct(),
                    conflicted: self.conflict_by_node.contains_key(&index),
                    incoming,
                })
            })
            .collect();
        packages.sort_by(|a, b| {
            a.identity
                .key()
                .cmp(&b.identity.key())
                .then_with(|| a.identity.version.cmp(&b.identity.version))
        });

        let mut messages: Vec<LogMessage> = self
            .conflicts
            .iter()
            .map(|conflict| {
                LogMessage::error(conflict.code.clone(), conflict.message.clone())
                    .with_framework(framework_name.clone())
                    .with_package(conflict.package_id.clone())
            })
            .collect();
        messages.extend(self.messages);

        let outcome = if self.conflicts.is_empty() {
            PassOutcome::Success
        } else {
            PassOutcome::Partial
        };
        debug!(
            "Finished {framework_name}: {} package(s), {} conflict(s), {} cycle(s)",
            packages.len(),
            self.conflicts.len(),
            self.cycles.len()
        );

        FrameworkResolution {
            framework: self.framework,
            packages,
            conflicts: self.conflicts,
            cycles: self.cycles,
            messages,
            outcome,
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

/// Formats a conflict message listing every competing requirement.
///
/// A non-empty `fallback` is used as-is for codes other than NU1107.
fn conflict_message(id: &str, code: &LogCode, competing: &[(String, VersionRange)], fallback: &str) -> String {
    if *code != NU1107 && !fallback.is_empty() {
        return fallback.to_string();
    }
    let requirements: Vec<String> = competing
        .iter()
        .map(|(source, range)| format!("{source} -> {id} ({})", range.pretty()))
        .collect();
    format!("Version conflict detected for {id}: {}", requirements.join("; "))
}

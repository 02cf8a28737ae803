use super::*;
use crate::framework::Framework;
use crate::models::{DependencyGroup, PackageDependency};
use crate::provider::InMemoryFeed;
use crate::report::codes::{NU1101, NU1102, NU1107, NU1201, NU1603, NU1605, NU1608};
use crate::version::{NuGetVersion, VersionRange};
use std::collections::HashSet;
use std::time::Duration;

fn v(text: &str) -> NuGetVersion {
    NuGetVersion::parse(text).unwrap()
}

fn fw(moniker: &str) -> Framework {
    Framework::parse(moniker).unwrap()
}

fn dep(id: &str, range: &str) -> PackageDependency {
    PackageDependency::new(id, VersionRange::parse(range).unwrap())
}

fn package(id: &str, range: &str) -> RequestedDependency {
    RequestedDependency::Package {
        id: id.to_string(),
        range: VersionRange::parse(range).unwrap(),
        pinned: false,
        frameworks: Vec::new(),
    }
}

fn pinned(id: &str, version: &str) -> RequestedDependency {
    RequestedDependency::Package {
        id: id.to_string(),
        range: VersionRange::at_least(v(version)),
        pinned: true,
        frameworks: Vec::new(),
    }
}

/// Adds a package whose catch-all group lists `deps`.
fn add(feed: &InMemoryFeed, id: &str, version: &str, deps: &[(&str, &str)]) {
    let dependencies = deps.iter().map(|(id, range)| dep(id, range)).collect();
    feed.add_package(id, v(version), vec![DependencyGroup::catch_all(dependencies)]);
}

async fn resolve_one(feed: InMemoryFeed, dependencies: Vec<RequestedDependency>) -> FrameworkResolution {
    let request = ResolutionRequest::single("App", vec![fw("net6.0")], dependencies);
    let mut result = Resolver::new(Arc::new(feed))
        .resolve(&request, &CancellationToken::new())
        .await
        .unwrap();
    result.frameworks.remove(0)
}

#[tokio::test]
async fn test_direct_pinned_reference_wins() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("B", "[2.0.0, 3.0.0)")]);
    add(&feed, "A", "1.5.0", &[("B", "[2.0.0, 3.0.0)")]);
    for version in ["2.0.0", "2.5.0", "2.9.0"] {
        add(&feed, "B", version, &[]);
    }

    let pass = resolve_one(feed, vec![package("A", ">= 1.0.0"), pinned("B", "2.5.0")]).await;
    assert!(pass.is_success());
    assert!(pass.conflicts.is_empty());
    assert_eq!(pass.package("A").unwrap().identity.version, v("1.5.0"));
    let b = pass.package("B").unwrap();
    assert_eq!(b.identity.version, v("2.5.0"));
    assert!(b.direct);
    assert_eq!(b.incoming.len(), 2);
}

#[tokio::test]
async fn test_non_overlapping_ranges_report_one_conflict() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("X", "[1.0, 2.0)")]);
    add(&feed, "B", "1.0.0", &[("X", "[3.0, 4.0)")]);
    add(&feed, "X", "1.5.0", &[]);
    add(&feed, "X", "3.5.0", &[]);

    let pass = resolve_one(feed, vec![package("A", "1.0.0"), package("B", "1.0.0")]).await;
    assert_eq!(pass.outcome, PassOutcome::Partial);
    assert_eq!(pass.conflicts.len(), 1);
    let conflict = &pass.conflicts[0];
    assert_eq!(conflict.package_id, "X");
    assert_eq!(conflict.code, NU1107);
    assert_eq!(conflict.competing.len(), 2);
    assert!(conflict.message.contains("A 1.0.0 -> X"));
    assert!(conflict.message.contains("B 1.0.0 -> X"));
    assert!(pass.package("X").is_none());
    assert!(pass.package("A").is_some());
}

#[tokio::test]
async fn test_cycle_is_broken() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("B", "1.0.0")]);
    add(&feed, "B", "1.0.0", &[("A", "1.0.0")]);

    let pass = resolve_one(feed, vec![package("A", "1.0.0")]).await;
    assert!(pass.is_success());
    assert_eq!(pass.packages.len(), 2);
    assert_eq!(pass.cycles.len(), 1);
    assert_eq!(pass.cycles[0].path, ["A", "B", "A"]);

    let broken: Vec<_> = pass
        .edges
        .iter()
        .filter(|e| e.status == EdgeStatus::CycleBroken)
        .collect();
    assert_eq!(broken.len(), 1);
    assert_eq!(pass.nodes[broken[0].to].id, "A");
    assert_eq!(pass.nodes[broken[0].from].id, "B");
}

#[tokio::test]
async fn test_self_dependency_is_broken() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("A", "1.0.0")]);
    let pass = resolve_one(feed, vec![package("A", "1.0.0")]).await;
    assert!(pass.is_success());
    assert_eq!(pass.cycles[0].path, ["A", "A"]);
}

/// App -> A -> X, App -> C -> X and X -> C: the cycle closes through C's own
/// path to X, whichever root reference is walked first.
fn second_path_cycle_feed() -> InMemoryFeed {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("X", "[1.0.0, )")]);
    add(&feed, "C", "1.0.0", &[("X", "[1.0.0, )")]);
    add(&feed, "X", "1.0.0", &[("C", "[2.0.0, )")]);
    feed
}

#[tokio::test]
async fn test_cycle_through_second_path_is_broken() {
    for order in [["A", "C"], ["C", "A"]] {
        let deps = order.iter().map(|id| package(id, "1.0.0")).collect();
        let pass = resolve_one(second_path_cycle_feed(), deps).await;

        assert!(pass.is_success(), "order {order:?}: {:?}", pass.conflicts);
        assert_eq!(pass.cycles.len(), 1, "order {order:?}");
        assert_eq!(pass.cycles[0].path, ["C", "X", "C"]);
        let broken: Vec<_> = pass
            .edges
            .iter()
            .filter(|e| e.status == EdgeStatus::CycleBroken)
            .collect();
        assert_eq!(broken.len(), 1);
        assert_eq!(pass.nodes[broken[0].from].id, "X");
        assert_eq!(pass.nodes[broken[0].to].id, "C");
    }
}

#[tokio::test]
async fn test_cycle_marking_ignores_reference_order() {
    let summary = |pass: &FrameworkResolution| {
        let packages: Vec<String> = pass.packages.iter().map(|p| p.identity.to_string()).collect();
        let cycles: Vec<String> = pass.cycles.iter().map(ToString::to_string).collect();
        (packages, cycles, pass.conflicts.len())
    };
    let first = resolve_one(second_path_cycle_feed(), vec![package("A", "1.0.0"), package("C", "1.0.0")]).await;
    let second = resolve_one(second_path_cycle_feed(), vec![package("C", "1.0.0"), package("A", "1.0.0")]).await;
    assert_eq!(summary(&first), summary(&second));
}

#[tokio::test]
async fn test_dedup_one_node_per_id() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("Common", "[1.0, )")]);
    add(&feed, "B", "1.0.0", &[("common", "[1.1, )")]);
    add(&feed, "C", "1.0.0", &[("A", "1.0.0")]);
    add(&feed, "Common", "1.0.0", &[]);
    add(&feed, "Common", "1.2.0", &[]);

    let pass = resolve_one(
        feed,
        vec![package("A", "1.0.0"), package("B", "1.0.0"), package("C", "1.0.0")],
    )
    .await;
    assert!(pass.is_success());

    let mut seen = HashSet::new();
    for node in &pass.nodes {
        assert!(seen.insert(node.id.to_ascii_lowercase()), "duplicate node {}", node.id);
    }
    let common = pass.package("COMMON").unwrap();
    assert_eq!(common.identity.version, v("1.2.0"));
    assert_eq!(common.incoming.len(), 2);
    assert_eq!(pass.package("A").unwrap().incoming.len(), 2);
}

#[tokio::test]
async fn test_resolution_is_deterministic() {
    let build = || {
        let feed = InMemoryFeed::new("memory").with_latency(Duration::from_millis(1));
        add(&feed, "A", "1.0.0", &[("C", "[1.0, )"), ("D", "[1.0, )")]);
        add(&feed, "B", "1.0.0", &[("D", "[1.0, 2.0)"), ("E", "[5.0, )")]);
        add(&feed, "C", "1.0.0", &[("A", "1.0.0")]);
        add(&feed, "D", "1.0.0", &[]);
        add(&feed, "D", "1.9.0", &[]);
        feed
    };
    let deps = || vec![package("A", "1.0.0"), package("B", "1.0.0")];

    let first = serde_json::to_string(&resolve_one(build(), deps()).await).unwrap();
    let second = serde_json::to_string(&resolve_one(build(), deps()).await).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_package_and_version() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[]);

    let pass = resolve_one(feed, vec![package("Ghost", "1.0.0"), package("A", "[2.0, )")]).await;
    assert_eq!(pass.conflicts.len(), 2);
    assert_eq!(pass.conflicts[0].code, NU1101);
    assert_eq!(pass.conflicts[1].code, NU1102);
    assert!(pass.conflicts[1].message.contains("Found 1 version(s) in memory"));
    assert_eq!(pass.nodes[1].state, NodeState::Conflicted);
    assert!(pass.packages.is_empty());
}

#[tokio::test]
async fn test_downgrade_below_transitive_lower_bound() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("B", "[2.0.0, )")]);
    add(&feed, "B", "1.0.0", &[]);
    add(&feed, "B", "2.0.0", &[]);

    let pass = resolve_one(feed, vec![package("A", "1.0.0"), pinned("B", "1.0.0")]).await;
    assert_eq!(pass.conflicts.len(), 1);
    assert_eq!(pass.conflicts[0].code, NU1605);
    let b = pass.package("B").unwrap();
    assert_eq!(b.identity.version, v("1.0.0"));
    assert!(b.conflicted);
}

#[tokio::test]
async fn test_direct_above_transitive_upper_bound_warns() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("B", "[1.0.0, 2.0.0)")]);
    add(&feed, "B", "3.0.0", &[]);

    let pass = resolve_one(feed, vec![package("A", "1.0.0"), pinned("B", "3.0.0")]).await;
    assert!(pass.is_success());
    assert_eq!(pass.messages.len(), 1);
    assert_eq!(pass.messages[0].code, NU1608);
    assert_eq!(pass.package("B").unwrap().identity.version, v("3.0.0"));
}

#[tokio::test]
async fn test_transitive_winner_violating_deeper_constraint_conflicts() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("X", "[1.0, 2.0)")]);
    add(&feed, "B", "1.0.0", &[("C", "1.0.0")]);
    add(&feed, "C", "1.0.0", &[("X", "[3.0, )")]);
    add(&feed, "X", "1.0.0", &[]);
    add(&feed, "X", "3.0.0", &[]);

    let pass = resolve_one(feed, vec![package("A", "1.0.0"), package("B", "1.0.0")]).await;
    assert_eq!(pass.conflicts.len(), 1);
    assert_eq!(pass.conflicts[0].code, NU1107);
    assert_eq!(pass.conflicts[0].competing.len(), 2);
}

#[tokio::test]
async fn test_deeper_constraint_narrows_transitive_choice() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("X", "[1.0, )")]);
    add(&feed, "B", "1.0.0", &[("C", "1.0.0")]);
    add(&feed, "C", "1.0.0", &[("X", "[1.0, 2.0)")]);
    add(&feed, "D", "1.0.0", &[]);
    add(&feed, "X", "1.5.0", &[]);
    add(&feed, "X", "2.5.0", &[("D", "1.0.0")]);

    let pass = resolve_one(feed, vec![package("A", "1.0.0"), package("B", "1.0.0")]).await;
    assert!(pass.is_success(), "{:?}", pass.conflicts);
    let x = pass.package("X").unwrap();
    assert_eq!(x.identity.version, v("1.5.0"));
    assert_eq!(x.incoming.len(), 2);
    assert!(!x.conflicted);
    assert!(pass.package("D").is_none());
    assert!(pass.messages.is_empty());
}

#[tokio::test]
async fn test_deeper_constraint_without_available_version_conflicts() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("X", "[1.0, )")]);
    add(&feed, "B", "1.0.0", &[("C", "1.0.0")]);
    add(&feed, "C", "1.0.0", &[("X", "[1.0, 2.0)")]);
    add(&feed, "X", "2.5.0", &[]);

    let pass = resolve_one(feed, vec![package("A", "1.0.0"), package("B", "1.0.0")]).await;
    assert_eq!(pass.conflicts.len(), 1);
    assert_eq!(pass.conflicts[0].code, NU1107);
    assert_eq!(pass.conflicts[0].package_id, "X");
    assert_eq!(pass.conflicts[0].competing.len(), 2);
}

#[tokio::test]
async fn test_pinned_version_missing_uses_lowest_match() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.2.0", &[]);
    add(&feed, "A", "1.5.0", &[]);

    let pass = resolve_one(feed, vec![pinned("A", "1.1.0")]).await;
    assert!(pass.is_success());
    assert_eq!(pass.package("A").unwrap().identity.version, v("1.2.0"));
    assert_eq!(pass.messages[0].code, NU1603);
}

#[tokio::test]
async fn test_prerelease_versions_need_prerelease_bounds() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[]);
    add(&feed, "A", "2.0.0-beta", &[]);

    let stable = resolve_one(feed.clone(), vec![package("A", "[1.0, )")]).await;
    assert_eq!(stable.package("A").unwrap().identity.version, v("1.0.0"));

    let pre = resolve_one(feed, vec![package("A", "[2.0.0-alpha, )")]).await;
    assert_eq!(pre.package("A").unwrap().identity.version, v("2.0.0-beta"));
}

#[tokio::test]
async fn test_framework_specific_groups() {
    let feed = InMemoryFeed::new("memory");
    feed.add_package(
        "A",
        v("1.0.0"),
        vec![
            DependencyGroup::new(fw("net472"), vec![dep("Legacy", "1.0.0")]),
            DependencyGroup::new(fw("netstandard2.0"), vec![dep("Modern", "1.0.0")]),
        ],
    );
    add(&feed, "Legacy", "1.0.0", &[]);
    add(&feed, "Modern", "1.0.0", &[]);

    let request = ResolutionRequest::single("App", vec![fw("net6.0"), fw("net48")], vec![package("A", "1.0.0")]);
    let result = Resolver::new(Arc::new(feed))
        .resolve(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.frameworks.len(), 2);
    assert!(result.frameworks[0].package("Modern").is_some());
    assert!(result.frameworks[0].package("Legacy").is_none());
    assert!(result.for_framework("net48").unwrap().package("Legacy").is_some());
}

#[tokio::test]
async fn test_project_references() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "Shared", "1.0.0", &[]);

    let spec = ProjectSpec::from_toml(
        r#"
name = "App"
frameworks = ["net6.0", "net45"]

[[dependencies]]
project = "Lib"

[[projects]]
name = "Lib"
frameworks = ["netstandard2.0"]

[[projects.dependencies]]
id = "Shared"
version = "1.0.0"

[[projects.dependencies]]
project = "App"
"#,
    )
    .unwrap();
    let request = ResolutionRequest::from_spec(&spec, true).unwrap();
    let result = Resolver::new(Arc::new(feed))
        .resolve(&request, &CancellationToken::new())
        .await
        .unwrap();

    let modern = &result.frameworks[0];
    assert!(modern.is_success());
    assert!(modern.package("Shared").is_some());
    assert_eq!(modern.cycles.len(), 1);

    let legacy = &result.frameworks[1];
    assert_eq!(legacy.conflicts.len(), 1);
    assert_eq!(legacy.conflicts[0].code, NU1201);
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_provider_failure_is_protocol_error() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("Broken", "1.0.0")]);
    feed.fail_on("Broken", "connection reset");

    let request = ResolutionRequest::single("App", vec![fw("net6.0")], vec![package("A", "1.0.0")]);
    let error = Resolver::new(Arc::new(feed))
        .resolve(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    match error {
        ResolveError::Protocol {
            source_name,
            package_id,
            cause,
        } => {
            assert_eq!(source_name, "memory");
            assert_eq!(package_id, "Broken");
            assert_eq!(cause.to_string(), "connection reset");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancellation_returns_no_graph() {
    let feed = InMemoryFeed::new("memory").with_latency(Duration::from_secs(30));
    add(&feed, "A", "1.0.0", &[]);
    let request = ResolutionRequest::single("App", vec![fw("net6.0")], vec![package("A", "1.0.0")]);
    let cancel = CancellationToken::new();

    let resolver = Resolver::new(Arc::new(feed));
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let result = resolver.resolve(&request, &cancel).await;
    assert!(matches!(result, Err(ResolveError::Cancelled)));
}

#[tokio::test]
async fn test_passes_share_cache() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[]);
    let request = ResolutionRequest::single(
        "App",
        vec![fw("net6.0"), fw("net472")],
        vec![package("A", "1.0.0")],
    );
    let resolver = Resolver::new(Arc::new(feed.clone()));
    resolver.resolve(&request, &CancellationToken::new()).await.unwrap();
    let after_first = feed.call_count();
    resolver.resolve(&request, &CancellationToken::new()).await.unwrap();
    assert_eq!(feed.call_count(), after_first);
    assert!(after_first <= 4);
    assert_eq!(resolver.cache().len(), 2);
}

#[tokio::test]
async fn test_install_order_from_pass() {
    let feed = InMemoryFeed::new("memory");
    add(&feed, "A", "1.0.0", &[("B", "1.0.0")]);
    add(&feed, "B", "1.0.0", &[("C", "1.0.0")]);
    add(&feed, "C", "1.0.0", &[]);

    let pass = resolve_one(feed, vec![package("A", "1.0.0")]).await;
    let order: Vec<String> = ResolvedGraph::from_resolution(&pass)
        .install_order()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(order, ["C", "B", "A"]);
}

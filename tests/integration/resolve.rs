//! Resolution of request files against folder feeds.

use crate::common::TestProject;
use nuresolve_cli::framework::Framework;
use nuresolve_cli::provider::LocalFolderFeed;
use nuresolve_cli::report::codes::{NU1107, NU1603};
use nuresolve_cli::resolver::{
    EdgeStatus, PassOutcome, ProjectSpec, ResolutionRequest, ResolutionResult, ResolvedGraph,
    Resolver,
};
use nuresolve_cli::version::NuGetVersion;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn v(text: &str) -> NuGetVersion {
    NuGetVersion::parse(text).unwrap()
}

async fn resolve(project: &TestProject) -> ResolutionResult {
    let spec = ProjectSpec::load(&project.request_path()).await.unwrap();
    let request = ResolutionRequest::from_spec(&spec, true).unwrap();
    Resolver::new(Arc::new(LocalFolderFeed::new(project.feed_dir())))
        .resolve(&request, &CancellationToken::new())
        .await
        .unwrap()
}

/// Direct bare-version reference wins over a transitive range
#[tokio::test]
async fn test_direct_reference_wins_over_transitive_range() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("B", "[2.0.0, 3.0.0)")]);
    project.add_package("A", "1.2.0", &[("B", "[2.0.0, 3.0.0)")]);
    for version in ["2.0.0", "2.5.0", "2.9.0"] {
        project.add_package("B", version, &[]);
    }
    project.write_request(&[("A", ">= 1.0.0"), ("B", "2.5.0")]);

    let result = resolve(&project).await;
    assert!(result.is_success());
    let pass = result.for_framework("net6.0").unwrap();
    assert!(pass.conflicts.is_empty());
    assert_eq!(pass.package("A").unwrap().identity.version, v("1.2.0"));
    assert_eq!(pass.package("B").unwrap().identity.version, v("2.5.0"));
    assert!(pass.package("B").unwrap().direct);
}

/// Non-overlapping ranges produce exactly one conflict and no choice
#[tokio::test]
async fn test_non_overlapping_ranges_conflict() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("X", "[1.0, 2.0)")]);
    project.add_package("B", "1.0.0", &[("X", "[3.0, 4.0)")]);
    project.add_package("X", "1.5.0", &[]);
    project.add_package("X", "3.5.0", &[]);
    project.write_request(&[("A", "[1.0.0, )"), ("B", "[1.0.0, )")]);

    let result = resolve(&project).await;
    assert!(!result.is_success());
    let pass = &result.frameworks[0];
    assert_eq!(pass.outcome, PassOutcome::Partial);
    assert_eq!(pass.conflicts.len(), 1);
    assert_eq!(pass.conflicts[0].package_id, "X");
    assert_eq!(pass.conflicts[0].code, NU1107);
    assert!(pass.package("X").is_none());
    assert!(result.report().has_errors());
}

/// A cycle terminates and is marked on the closing edge
#[tokio::test]
async fn test_cycle_terminates() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("B", "[1.0.0, )")]);
    project.add_package("B", "1.0.0", &[("A", "[1.0.0, )")]);
    project.write_request(&[("A", "[1.0.0, )")]);

    let result = resolve(&project).await;
    let pass = &result.frameworks[0];
    assert!(pass.is_success());
    assert_eq!(pass.packages.len(), 2);
    assert_eq!(pass.cycles.len(), 1);
    assert_eq!(pass.cycles[0].to_string(), "A -> B -> A");
    assert_eq!(
        pass.edges.iter().filter(|e| e.status == EdgeStatus::CycleBroken).count(),
        1
    );

    let tree = ResolvedGraph::from_resolution(pass).to_tree_string();
    assert!(tree.contains("(circular reference)"));
}

/// A deeper range narrows a transitive choice when a common version exists
#[tokio::test]
async fn test_deeper_range_narrows_transitive_choice() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("X", "[1.0, )")]);
    project.add_package("B", "1.0.0", &[("C", "[1.0, )")]);
    project.add_package("C", "1.0.0", &[("X", "[1.0, 2.0)")]);
    project.add_package("X", "1.5.0", &[]);
    project.add_package("X", "2.5.0", &[]);
    project.write_request(&[("A", "[1.0.0, )"), ("B", "[1.0.0, )")]);

    let result = resolve(&project).await;
    assert!(result.is_success());
    let pass = &result.frameworks[0];
    assert_eq!(pass.package("X").unwrap().identity.version, v("1.5.0"));
    assert!(!result.report().has_errors());
}

/// Shared dependencies become one node per id
#[tokio::test]
async fn test_dedup_and_install_order() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("Common", "[1.0, )")]);
    project.add_package("B", "1.0.0", &[("Common", "[1.1, )")]);
    project.add_package("Common", "1.0.0", &[]);
    project.add_package("Common", "1.1.0", &[]);
    project.write_request(&[("A", "[1.0.0, )"), ("B", "[1.0.0, )")]);

    let result = resolve(&project).await;
    let pass = &result.frameworks[0];
    let mut ids = HashSet::new();
    for node in &pass.nodes {
        assert!(ids.insert(node.id.to_ascii_lowercase()));
    }
    assert_eq!(pass.package("Common").unwrap().identity.version, v("1.1.0"));

    let order: Vec<String> = ResolvedGraph::from_resolution(pass)
        .install_order()
        .into_iter()
        .map(|identity| identity.id)
        .collect();
    let position = |id: &str| order.iter().position(|o| o == id).unwrap();
    assert!(position("Common") < position("A"));
    assert!(position("Common") < position("B"));
}

/// Identical inputs give identical output
#[tokio::test]
async fn test_resolution_is_deterministic() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[("C", "[1.0, )"), ("D", "[1.0, )")]);
    project.add_package("B", "1.0.0", &[("D", "[1.0, 2.0)"), ("E", "[1.0, )")]);
    project.add_package("C", "1.0.0", &[("A", "1.0.0")]);
    project.add_package("D", "1.0.0", &[]);
    project.add_package("D", "1.9.0", &[]);
    project.write_request(&[("A", "[1.0.0, )"), ("B", "[1.0.0, )")]);

    let first = serde_json::to_string(&resolve(&project).await).unwrap();
    let second = serde_json::to_string(&resolve(&project).await).unwrap();
    assert_eq!(first, second);
}

/// A missing pinned version falls back to the lowest higher one with a warning
#[tokio::test]
async fn test_missing_pinned_version_warns() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.1.0", &[]);
    project.add_package("A", "1.3.0", &[]);
    project.write_request(&[("A", "1.0.0")]);

    let result = resolve(&project).await;
    let pass = &result.frameworks[0];
    assert!(pass.is_success());
    assert_eq!(pass.package("A").unwrap().identity.version, v("1.1.0"));
    assert!(pass.messages.iter().any(|m| m.code == NU1603));
}

/// Each requested framework gets its own pass
#[tokio::test]
async fn test_framework_override() {
    let project = TestProject::new().unwrap();
    project.add_package("A", "1.0.0", &[]);
    project.write_request(&[("A", "1.0.0")]);

    let spec = ProjectSpec::load(&project.request_path()).await.unwrap();
    let request = ResolutionRequest::from_spec(&spec, true).unwrap().with_frameworks(vec![
        Framework::parse("net6.0").unwrap(),
        Framework::parse("netstandard2.0").unwrap(),
    ]);
    let result = Resolver::new(Arc::new(LocalFolderFeed::new(project.feed_dir())))
        .resolve(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.frameworks.len(), 2);
    assert!(result.for_framework("netstandard2.0").unwrap().package("A").is_some());
}

//! Package rules over extracted package directories.

use crate::common::TestProject;
use nuresolve_cli::report::codes::{NU5100, NU5128, NU5130};
use nuresolve_cli::rules::{DirectoryPackage, PackageView, RuleSet};

const METADATA: &str = "    <version>1.0.0</version>\n    <description>Core types</description>";

fn validate(dir: &std::path::Path) -> nuresolve_cli::report::Report {
    let view = PackageView::from_lister(&DirectoryPackage::new(dir)).unwrap();
    RuleSet::standard().run(&view)
}

/// An assembly under tools/ is reported once, naming its path
#[test]
fn test_assembly_outside_lib() {
    let project = TestProject::new().unwrap();
    let dir = project.add_package_dir("Contoso.Core", METADATA, &["tools/foo.dll"]);

    let report = validate(&dir);
    let code = NU5100;
    let messages: Vec<_> = report.with_code(&code).collect();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].message.contains("tools/foo.dll"));
    assert_eq!(messages[0].package_id.as_deref(), Some("Contoso.Core"));
}

/// A net6.0 dependency group over lib/net5.0 is compatible but not exact
#[test]
fn test_dependency_group_compatible_not_exact() {
    let project = TestProject::new().unwrap();
    let metadata = format!(
        "{METADATA}\n    <dependencies>\n      <group targetFramework=\"net6.0\" />\n    </dependencies>"
    );
    let dir = project.add_package_dir("Contoso.Core", &metadata, &["lib/net5.0/Contoso.Core.dll"]);

    let report = validate(&dir);
    assert_eq!(report.with_code(&NU5130).count(), 1);
    assert_eq!(report.with_code(&NU5128).count(), 0);
}

/// A dependency group with no compatible lib folder is a mismatch
#[test]
fn test_dependency_group_without_match() {
    let project = TestProject::new().unwrap();
    let metadata = format!(
        "{METADATA}\n    <dependencies>\n      <group targetFramework=\"net6.0\" />\n    </dependencies>"
    );
    let dir = project.add_package_dir("Contoso.Core", &metadata, &["lib/net472/Contoso.Core.dll"]);

    let report = validate(&dir);
    assert_eq!(report.with_code(&NU5128).count(), 1);
    assert_eq!(report.with_code(&NU5130).count(), 0);
}

/// A conventional package produces no messages
#[test]
fn test_clean_package() {
    let project = TestProject::new().unwrap();
    let metadata = format!(
        "{METADATA}\n    <dependencies>\n      <group targetFramework=\"net6.0\" />\n    </dependencies>"
    );
    let dir = project.add_package_dir("Contoso.Core", &metadata, &["lib/net6.0/Contoso.Core.dll"]);

    let report = validate(&dir);
    assert!(report.is_empty(), "unexpected messages: {}", report.render_text());
}

/// Packaging metadata files are not package content
#[test]
fn test_packaging_files_are_ignored() {
    let project = TestProject::new().unwrap();
    let dir = project.add_package_dir(
        "Contoso.Core",
        METADATA,
        &[
            "lib/net6.0/Contoso.Core.dll",
            "[Content_Types].xml",
            "_rels/.rels",
            "package/services/metadata/core-properties/abc.psmdcp",
        ],
    );

    let view = PackageView::from_lister(&DirectoryPackage::new(&dir)).unwrap();
    assert_eq!(view.files, vec!["lib/net6.0/Contoso.Core.dll".to_string()]);
}

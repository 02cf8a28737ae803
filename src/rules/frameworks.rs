//! Framework folder rules.

use super::{PackageRule, PackageView};
use crate::constants::PLACEHOLDER_FILE_NAME;
use crate::content::patterns;
use crate::framework::{CompatibilityTable, Framework};
use crate::report::codes::{NU5103, NU5127, NU5128, NU5130, NU5131};
use crate::report::{LogCode, LogMessage};
use std::sync::Arc;

fn folder_names(frameworks: &[Framework]) -> String {
    frameworks
        .iter()
        .map(Framework::short_folder_name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn has_top_folder(package: &PackageView, folder: &str) -> bool {
    package.files.iter().any(|path| {
        path.split_once('/')
            .is_some_and(|(top, _)| top.eq_ignore_ascii_case(folder))
    })
}

/// Flags `lib`, `ref` and `build` subfolders whose name is not a framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidFrameworkFolderRule;

impl PackageRule for InvalidFrameworkFolderRule {
    fn code(&self) -> LogCode {
        NU5103
    }

    fn name(&self) -> &'static str {
        "invalid-framework-folder"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        let content = package.content();
        let mut folders: Vec<String> = Vec::new();
        for (root, set) in [
            ("lib", patterns::lib_folders()),
            ("ref", patterns::ref_folders()),
            ("build", patterns::build_folders()),
        ] {
            for invalid in content.invalid_framework_tokens(&set) {
                let folder = format!("{root}/{}", invalid.token);
                if !folders.contains(&folder) {
                    folders.push(folder);
                }
            }
        }
        folders
            .into_iter()
            .map(|folder| {
                LogMessage::warning(
                    NU5103,
                    format!(
                        "The folder '{folder}' under the package root is not recognized as a \
                         valid framework name or a supported culture identifier. Rename it to a \
                         valid framework name or culture identifier."
                    ),
                )
            })
            .collect()
    }
}

/// Flags framework-specific `build/` content in a package with no `lib` or
/// `ref` folder.
///
/// Without `lib`/`ref` the package installs into every framework, so the
/// `build/{tfm}` folders never narrow anything. Empty placeholder files are
/// suggested for each framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildWithoutLibRule;

impl PackageRule for BuildWithoutLibRule {
    fn code(&self) -> LogCode {
        NU5127
    }

    fn name(&self) -> &'static str {
        "build-without-lib"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        if has_top_folder(package, "lib") || has_top_folder(package, "ref") {
            return Vec::new();
        }
        let frameworks: Vec<Framework> = package
            .content()
            .find_item_groups(&patterns::build_folders())
            .iter()
            .filter_map(|group| group.framework().cloned())
            .filter(|framework| !framework.is_any())
            .collect();
        if frameworks.is_empty() {
            return Vec::new();
        }
        let suggestions = frameworks
            .iter()
            .map(|f| format!("- lib/{}/{PLACEHOLDER_FILE_NAME}", f.short_folder_name()))
            .collect::<Vec<_>>()
            .join("\n");
        vec![LogMessage::warning(
            NU5127,
            format!(
                "This package does not contain a lib/ or ref/ folder, and will therefore be \
                 treated as compatible for all frameworks. Since framework specific files were \
                 found under the build/ directory for {}, consider creating the following empty \
                 files to correctly narrow the compatibility of the package:\n{suggestions}",
                folder_names(&frameworks)
            ),
        )]
    }
}

/// Compares manifest dependency-group frameworks with `lib`/`ref` folder
/// frameworks.
///
/// Frameworks present on one side without an exact counterpart are split into
/// two findings:
///
/// - NU5130: a compatible but different framework exists on the other side
///   (a `net6.0` group served by `lib/net5.0`)
/// - NU5128: nothing on the other side is compatible
///
/// Each category yields at most one message. A manifest without dependency
/// groups yields nothing, and the framework-less group is ignored.
#[derive(Debug, Clone)]
pub struct DependencyGroupParityRule {
    table: Arc<CompatibilityTable>,
}

impl DependencyGroupParityRule {
    /// Creates the rule over `table`.
    #[must_use]
    pub fn new(table: Arc<CompatibilityTable>) -> Self {
        Self { table }
    }

    fn compatible_either_way(&self, a: &Framework, b: &Framework) -> bool {
        self.table.is_compatible(a, b) || self.table.is_compatible(b, a)
    }
}

impl Default for DependencyGroupParityRule {
    fn default() -> Self {
        Self::new(Arc::new(CompatibilityTable::standard()))
    }
}

impl PackageRule for DependencyGroupParityRule {
    fn code(&self) -> LogCode {
        NU5128
    }

    fn name(&self) -> &'static str {
        "dependency-group-parity"
    }

    fn codes(&self) -> Vec<LogCode> {
        vec![NU5128, NU5130]
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        if !package.manifest.has_dependency_groups() {
            return Vec::new();
        }
        let mut groups: Vec<Framework> = Vec::new();
        for framework in package
            .manifest
            .dependency_groups
            .iter()
            .filter_map(|group| group.target_framework.as_ref())
        {
            if !groups.contains(framework) {
                groups.push(framework.clone());
            }
        }
        let files: Vec<Framework> = package
            .lib_ref_frameworks()
            .into_iter()
            .filter(|framework| !framework.is_any())
            .collect();

        let mut compatible: Vec<Framework> = Vec::new();
        let mut unmatched: Vec<Framework> = Vec::new();
        let mut paired_files: Vec<&Framework> = Vec::new();

        for group in groups.iter().filter(|group| !files.contains(group)) {
            let partner = files
                .iter()
                .filter(|file| !groups.contains(file))
                .find(|file| self.compatible_either_way(file, group));
            match partner {
                Some(file) => {
                    compatible.push(group.clone());
                    paired_files.push(file);
                }
                None => unmatched.push(group.clone()),
            }
        }
        for file in files
            .iter()
            .filter(|file| !groups.contains(file) && !paired_files.contains(file))
        {
            if groups.iter().any(|group| self.compatible_either_way(file, group)) {
                compatible.push(file.clone());
            } else {
                unmatched.push(file.clone());
            }
        }

        let mut messages = Vec::new();
        if !unmatched.is_empty() {
            messages.push(LogMessage::warning(
                NU5128,
                format!(
                    "Some target frameworks declared in the dependencies group of the nuspec and \
                     the lib/ref folder do not have exact matches in the other location: {}. \
                     Consult the project's framework list and add a matching dependency group or \
                     lib/ref folder for each.",
                    folder_names(&unmatched)
                ),
            ));
        }
        if !compatible.is_empty() {
            messages.push(LogMessage::warning(
                NU5130,
                format!(
                    "Some target frameworks declared in the dependencies group of the nuspec and \
                     the lib/ref folder have compatible matches, but not exact matches in the \
                     other location: {}. Unless intentional, consider changing the dependency \
                     groups or lib/ref folders to use exactly matching frameworks.",
                    folder_names(&compatible)
                ),
            ));
        }
        messages
    }
}

/// Flags manifest `<reference>` files with no counterpart under `ref/`.
///
/// A reference group for a framework expects `ref/{tfm}/{file}`; the
/// framework-less group expects the file in some `ref/` folder. Packages
/// without a `ref/` folder are not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceAssemblyRule;

impl PackageRule for ReferenceAssemblyRule {
    fn code(&self) -> LogCode {
        NU5131
    }

    fn name(&self) -> &'static str {
        "reference-assembly"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        if package.manifest.reference_groups.is_empty() || !has_top_folder(package, "ref") {
            return Vec::new();
        }
        let ref_groups = package.content().find_item_groups(&patterns::ref_folders());
        let present = |framework: Option<&Framework>, file: &str| {
            ref_groups
                .iter()
                .filter(|group| framework.is_none() || group.framework() == framework)
                .flat_map(|group| group.items.iter())
                .any(|item| {
                    item.text(patterns::ANY)
                        .is_some_and(|rest| rest.eq_ignore_ascii_case(file))
                })
        };

        let mut missing: Vec<String> = Vec::new();
        for group in &package.manifest.reference_groups {
            let framework = group.target_framework.as_ref();
            for file in &group.references {
                if !present(framework, file) {
                    let folder = framework.map_or_else(|| "*".to_string(), Framework::short_folder_name);
                    missing.push(format!("ref/{folder}/{file}"));
                }
            }
        }
        if missing.is_empty() {
            return Vec::new();
        }
        vec![LogMessage::warning(
            NU5131,
            format!(
                "References were found in the nuspec, but some reference assemblies were not \
                 found in the ref folder. Add the following reference assemblies: {}",
                missing.join(", ")
            ),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestDocument;

    fn view(metadata: &str, files: &[&str]) -> PackageView {
        let xml = format!(
            "<package><metadata><id>Contoso.Core</id><version>1.0.0</version>{metadata}</metadata></package>"
        );
        PackageView::new(ManifestDocument::parse(&xml).unwrap(), files.iter().copied())
    }

    fn groups(frameworks: &[&str]) -> String {
        let groups: String = frameworks
            .iter()
            .map(|f| format!("<group targetFramework=\"{f}\" />"))
            .collect();
        format!("<dependencies>{groups}</dependencies>")
    }

    #[test]
    fn test_invalid_framework_folders() {
        let package = view(
            "",
            &["lib/net6.0/A.dll", "lib/.hidden/A.dll", "lib/.hidden/B.dll", "build/,x/A.targets", "lib/A.dll"],
        );
        let messages = InvalidFrameworkFolderRule.validate(&package);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].message.contains("'lib/.hidden'"));
        assert!(messages[1].message.contains("'build/,x'"));
    }

    #[test]
    fn test_build_without_lib() {
        let package = view("", &["build/net6.0/Contoso.Core.targets", "build/Contoso.Core.props"]);
        let messages = BuildWithoutLibRule.validate(&package);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].message.contains("lib/net6.0/_._"));

        let with_lib = view("", &["build/net6.0/Contoso.Core.targets", "lib/net6.0/A.dll"]);
        assert!(BuildWithoutLibRule.validate(&with_lib).is_empty());
    }

    #[test]
    fn test_parity_compatible_but_not_exact() {
        let package = view(&groups(&["net6.0"]), &["lib/net5.0/A.dll"]);
        let messages = DependencyGroupParityRule::default().validate(&package);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].code, NU5130);
        assert!(messages[0].message.contains("net6.0"));
    }

    #[test]
    fn test_parity_no_match() {
        let package = view(&groups(&["net6.0"]), &["lib/net472/A.dll"]);
        let messages = DependencyGroupParityRule::default().validate(&package);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].code, NU5128);
        assert!(messages[0].message.contains("net6.0"));
        assert!(messages[0].message.contains("net472"));
    }

    #[test]
    fn test_parity_exact_and_absent_groups() {
        let exact = view(&groups(&["net6.0", "netstandard2.0"]), &["lib/net6.0/A.dll", "ref/netstandard2.0/A.dll"]);
        assert!(DependencyGroupParityRule::default().validate(&exact).is_empty());

        let no_groups = view("", &["lib/net5.0/A.dll"]);
        assert!(DependencyGroupParityRule::default().validate(&no_groups).is_empty());
    }

    #[test]
    fn test_parity_keeps_categories_apart() {
        let package = view(&groups(&["net6.0", "net472"]), &["lib/net5.0/A.dll", "lib/netcoreapp3.1/A.dll"]);
        let messages = DependencyGroupParityRule::default().validate(&package);
        let codes: Vec<&LogCode> = messages.iter().map(|m| &m.code).collect();
        assert_eq!(codes, vec![&NU5128, &NU5130]);
    }

    #[test]
    fn test_reference_assemblies() {
        let references = "<references><group targetFramework=\"net6.0\">\
                          <reference file=\"Contoso.Core.dll\" />\
                          <reference file=\"Contoso.Extra.dll\" />\
                          </group></references>";
        let package = view(references, &["ref/net6.0/Contoso.Core.dll", "lib/net6.0/Contoso.Core.dll"]);
        let messages = ReferenceAssemblyRule.validate(&package);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].message.contains("ref/net6.0/Contoso.Extra.dll"));
        assert!(!messages[0].message.contains("ref/net6.0/Contoso.Core.dll"));

        let without_ref = view(references, &["lib/net6.0/Contoso.Core.dll"]);
        assert!(ReferenceAssemblyRule.validate(&without_ref).is_empty());
    }
}

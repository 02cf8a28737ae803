//! Manifest metadata rules.

use super::{PackageRule, PackageView};
use crate::report::codes::{NU5102, NU5104, NU5105};
use crate::report::{LogCode, LogMessage};

/// Placeholder values emitted by manifest templates.
const TEMPLATE_DEFAULTS: &[(&str, &str)] = &[
    ("projectUrl", "http://PROJECT_URL_HERE_OR_DELETE_THIS_LINE"),
    ("iconUrl", "http://ICON_URL_HERE_OR_DELETE_THIS_LINE"),
    ("licenseUrl", "http://LICENSE_URL_HERE_OR_DELETE_THIS_LINE"),
    ("tags", "Tag1 Tag2"),
    ("releaseNotes", "Summary of changes made in this release of the package."),
    ("description", "Package description"),
];

/// Dependency id left in by manifest templates.
const TEMPLATE_DEPENDENCY: &str = "SampleDependency";

/// Flags manifest fields still holding template placeholder values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMetadataRule;

impl PackageRule for DefaultMetadataRule {
    fn code(&self) -> LogCode {
        NU5102
    }

    fn name(&self) -> &'static str {
        "default-metadata"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        let metadata = &package.manifest.metadata;
        let fields = [
            metadata.project_url.as_deref(),
            metadata.icon_url.as_deref(),
            metadata.license_url.as_deref(),
            metadata.tags.as_deref(),
            metadata.release_notes.as_deref(),
            metadata.description.as_deref(),
        ];

        let mut messages: Vec<LogMessage> = TEMPLATE_DEFAULTS
            .iter()
            .zip(fields)
            .filter(|((_, default), value)| {
                value.is_some_and(|v| v.trim().eq_ignore_ascii_case(default))
            })
            .map(|((field, default), _)| default_value_message(field, default))
            .collect();

        if package
            .manifest
            .all_dependencies()
            .any(|dependency| dependency.id.eq_ignore_ascii_case(TEMPLATE_DEPENDENCY))
        {
            messages.push(default_value_message("dependency", TEMPLATE_DEPENDENCY));
        }
        messages
    }
}

fn default_value_message(field: &str, value: &str) -> LogMessage {
    LogMessage::warning(
        NU5102,
        format!(
            "The value \"{value}\" for {field} is a sample value and should be removed. Replace it \
             with an appropriate value or remove it and rebuild your package."
        ),
    )
}

/// Flags a stable package that depends on prerelease versions.
///
/// Only the first offending dependency is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrereleaseDependencyRule;

impl PackageRule for PrereleaseDependencyRule {
    fn code(&self) -> LogCode {
        NU5104
    }

    fn name(&self) -> &'static str {
        "prerelease-dependency"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        let Some(version) = &package.manifest.version else {
            return Vec::new();
        };
        if version.is_prerelease() {
            return Vec::new();
        }
        package
            .manifest
            .all_dependencies()
            .find(|dependency| dependency.range.has_prerelease_bounds())
            .map(|dependency| {
                LogMessage::warning(
                    NU5104,
                    format!(
                        "A stable release of a package should not have a prerelease dependency. \
                         Either modify the version spec of dependency \"{} {}\" or update the \
                         version field in the nuspec.",
                        dependency.id,
                        dependency.range.pretty()
                    ),
                )
            })
            .into_iter()
            .collect()
    }
}

/// Flags versions that only SemVer 2.0.0 aware clients understand.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemVer2VersionRule;

impl PackageRule for SemVer2VersionRule {
    fn code(&self) -> LogCode {
        NU5105
    }

    fn name(&self) -> &'static str {
        "semver2-version"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        match &package.manifest.version {
            Some(version) if version.is_semver2() => vec![LogMessage::warning(
                NU5105,
                format!(
                    "The package version '{}' uses SemVer 2.0.0 or components of SemVer 1.0.0 \
                     that are not supported on legacy clients. Change the package version to a \
                     SemVer 1.0.0 string. If the version contains a release label it must start \
                     with a letter.",
                    version.to_full_string()
                ),
            )],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestDocument;

    fn view(metadata: &str) -> PackageView {
        let xml = format!("<package><metadata>{metadata}</metadata></package>");
        PackageView::new(ManifestDocument::parse(&xml).unwrap(), Vec::<String>::new())
    }

    #[test]
    fn test_template_defaults_flagged_per_field() {
        let package = view(
            "<id>A</id><version>1.0.0</version>\
             <projectUrl>http://PROJECT_URL_HERE_OR_DELETE_THIS_LINE</projectUrl>\
             <tags>Tag1 Tag2</tags>\
             <description>A real description</description>\
             <dependencies><dependency id=\"SampleDependency\" version=\"1.0\" /></dependencies>",
        );
        let messages = DefaultMetadataRule.validate(&package);
        assert_eq!(messages.len(), 3);
        assert!(messages[0].message.contains("projectUrl"));
        assert!(messages[1].message.contains("tags"));
        assert!(messages[2].message.contains("SampleDependency"));
    }

    #[test]
    fn test_prerelease_dependency_reports_first_only() {
        let package = view(
            "<id>A</id><version>1.0.0</version><dependencies>\
             <dependency id=\"B\" version=\"1.0.0\" />\
             <dependency id=\"C\" version=\"[1.0.0-beta, 2.0.0)\" />\
             <dependency id=\"D\" version=\"2.0.0-rc.1\" />\
             </dependencies>",
        );
        let messages = PrereleaseDependencyRule.validate(&package);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].message.contains("\"C "));
    }

    #[test]
    fn test_prerelease_package_may_depend_on_prerelease() {
        let package = view(
            "<id>A</id><version>1.0.0-beta</version><dependencies>\
             <dependency id=\"C\" version=\"1.0.0-beta\" />\
             </dependencies>",
        );
        assert!(PrereleaseDependencyRule.validate(&package).is_empty());
    }

    #[test]
    fn test_missing_version_yields_nothing() {
        let package = view("<id>A</id>");
        assert!(PrereleaseDependencyRule.validate(&package).is_empty());
        assert!(SemVer2VersionRule.validate(&package).is_empty());
    }

    #[test]
    fn test_semver2_version() {
        assert_eq!(SemVer2VersionRule.validate(&view("<id>A</id><version>1.0.0-beta.1</version>")).len(), 1);
        assert_eq!(SemVer2VersionRule.validate(&view("<id>A</id><version>1.0.0+sha</version>")).len(), 1);
        assert!(SemVer2VersionRule.validate(&view("<id>A</id><version>1.0.0-beta</version>")).is_empty());
    }
}

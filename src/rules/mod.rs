//! Package validation rules.
//!
//! A rule inspects one [`PackageView`] and returns the findings it observes.
//! Rules are independent and side-effect free: a rule that lacks the data it
//! needs (no dependency groups, no `lib` folder) returns nothing instead of
//! failing, so one rule can never stop the others from running.
//!
//! # Rule Codes
//!
//! | Code | Rule | Finding |
//! |------|------|---------|
//! | NU5100 | [`AssemblyOutsideLibRule`] | assembly outside every asset folder |
//! | NU5101 | [`AssemblyDirectlyUnderLibRule`] | assembly directly under `lib/` |
//! | NU5102 | [`DefaultMetadataRule`] | template default left in the manifest |
//! | NU5103 | [`InvalidFrameworkFolderRule`] | unparsable framework folder |
//! | NU5104 | [`PrereleaseDependencyRule`] | stable package, prerelease dependency |
//! | NU5105 | [`SemVer2VersionRule`] | SemVer 2.0.0 package version |
//! | NU5109 | [`PlaceholderFileRule`] | `_._` next to other entries |
//! | NU5110 | [`ScriptOutsideToolsRule`] | `.ps1` outside `tools/` |
//! | NU5111 | [`UnrecognizedScriptRule`] | unknown script name in `tools/` |
//! | NU5127 | [`BuildWithoutLibRule`] | `build/{tfm}` without `lib`/`ref` |
//! | NU5128 / NU5130 | [`DependencyGroupParityRule`] | dependency groups vs `lib`/`ref` folders |
//! | NU5129 | [`MsBuildFileNameRule`] | MSBuild files not named after the id |
//! | NU5131 | [`ReferenceAssemblyRule`] | manifest references missing from `ref/` |
//!
//! # Example
//!
//! ```rust,no_run
//! use nuresolve_cli::manifest::ManifestDocument;
//! use nuresolve_cli::rules::{PackageView, RuleSet};
//!
//! let manifest = ManifestDocument::parse(
//!     "<package><metadata><id>A</id><version>1.0.0</version></metadata></package>",
//! )?;
//! let view = PackageView::new(manifest, ["tools/foo.dll"]);
//! let report = RuleSet::standard().run(&view);
//! assert_eq!(report.len(), 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod assemblies;
pub mod files;
pub mod frameworks;
pub mod metadata;
pub mod package;

pub use assemblies::{AssemblyDirectlyUnderLibRule, AssemblyOutsideLibRule};
pub use files::{MsBuildFileNameRule, PlaceholderFileRule, ScriptOutsideToolsRule, UnrecognizedScriptRule};
pub use frameworks::{
    BuildWithoutLibRule, DependencyGroupParityRule, InvalidFrameworkFolderRule,
    ReferenceAssemblyRule,
};
pub use metadata::{DefaultMetadataRule, PrereleaseDependencyRule, SemVer2VersionRule};
pub use package::{DirectoryPackage, PackageContentLister, PackageError, PackageView};

use crate::framework::CompatibilityTable;
use crate::report::{LogCode, LogMessage, Report};
use std::sync::Arc;
use tracing::debug;

/// One package check.
///
/// Implementations must not panic on partial metadata; missing data means no
/// findings.
pub trait PackageRule: Send + Sync {
    /// Code of the findings this rule emits. Rules emitting two codes report
    /// their primary one here.
    fn code(&self) -> LogCode;

    /// Short rule name for listings.
    fn name(&self) -> &'static str;

    /// Every code this rule can emit.
    fn codes(&self) -> Vec<LogCode> {
        vec![self.code()]
    }

    /// Inspects `package` and returns findings in discovery order.
    fn validate(&self, package: &PackageView) -> Vec<LogMessage>;
}

/// An ordered list of rules.
///
/// Output order follows rule order; messages are never re-sorted across rules.
#[derive(Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn PackageRule>>,
    disabled: Vec<LogCode>,
}

impl RuleSet {
    /// An empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in rule with the standard compatibility table.
    #[must_use]
    pub fn standard() -> Self {
        Self::with_table(Arc::new(CompatibilityTable::standard()))
    }

    /// Every built-in rule; framework comparisons use `table`.
    #[must_use]
    pub fn with_table(table: Arc<CompatibilityTable>) -> Self {
        Self::new()
            .with_rule(AssemblyOutsideLibRule)
            .with_rule(AssemblyDirectlyUnderLibRule)
            .with_rule(DefaultMetadataRule)
            .with_rule(InvalidFrameworkFolderRule)
            .with_rule(PrereleaseDependencyRule)
            .with_rule(SemVer2VersionRule)
            .with_rule(PlaceholderFileRule)
            .with_rule(ScriptOutsideToolsRule)
            .with_rule(UnrecognizedScriptRule)
            .with_rule(BuildWithoutLibRule)
            .with_rule(DependencyGroupParityRule::new(table))
            .with_rule(MsBuildFileNameRule)
            .with_rule(ReferenceAssemblyRule)
    }

    /// Appends a rule.
    #[must_use]
    pub fn with_rule(mut self, rule: impl PackageRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Drops every rule whose codes are all in `disabled`.
    ///
    /// A rule emitting several codes stays while any of them is enabled; its
    /// disabled codes are filtered from the report by [`RuleSet::run`].
    #[must_use]
    pub fn without_codes(mut self, disabled: &[LogCode]) -> Self {
        self.rules
            .retain(|rule| rule.codes().iter().any(|code| !disabled.contains(code)));
        self.disabled = disabled.to_vec();
        self
    }

    /// The rules in run order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn PackageRule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule against `package` and concatenates the findings.
    ///
    /// Each message is tagged with the package id.
    #[must_use]
    pub fn run(&self, package: &PackageView) -> Report {
        let id = package.id().to_string();
        let mut report = Report::default();
        for rule in &self.rules {
            let findings = rule.validate(package);
            debug!("Rule {} ({}) produced {} finding(s)", rule.name(), rule.code(), findings.len());
            for message in findings {
                if self.disabled.contains(&message.code) {
                    continue;
                }
                let message = if message.package_id.is_some() || id.is_empty() {
                    message
                } else {
                    message.with_package(id.clone())
                };
                report.push(message);
            }
        }
        report
    }
}

//! Package content classification by path conventions.
//!
//! A package is a flat list of file paths. [`ContentItemCollection`] matches
//! those paths against a [`PatternSet`], captures typed properties such as the
//! target framework or runtime identifier, and groups the matches so a caller
//! can pick the group nearest to a project framework.
//!
//! # Example
//!
//! ```rust,no_run
//! use nuresolve_cli::content::{ContentItemCollection, patterns};
//! use nuresolve_cli::framework::{CompatibilityTable, Framework};
//!
//! let collection = ContentItemCollection::load([
//!     "lib/net45/Foo.dll",
//!     "lib/netstandard2.0/Foo.dll",
//! ]);
//! let group = collection.find_best_item_group(
//!     &patterns::runtime_assemblies(),
//!     &Framework::parse("net6.0")?,
//!     None,
//!     &CompatibilityTable::standard(),
//! );
//! assert_eq!(group.unwrap().items[0].path, "lib/netstandard2.0/Foo.dll");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod patterns;

pub use patterns::{PatternDefinition, PatternSet, Properties, PropertyValue};

use crate::framework::{CompatibilityTable, Framework};
use patterns::PatternMatch;
use serde::Serialize;

/// A path together with the properties its pattern captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    /// Normalized package-relative path
    pub path: String,
    /// Captured and defaulted properties
    pub properties: Properties,
}

impl ContentItem {
    /// The `tfm` property, if captured.
    #[must_use]
    pub fn framework(&self) -> Option<&Framework> {
        self.properties.get(patterns::TFM).and_then(PropertyValue::as_framework)
    }

    /// A text property by name.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(PropertyValue::as_text)
    }
}

/// Items sharing the same values for a pattern set's grouping properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentItemGroup {
    /// Grouping property values; absent properties are omitted
    pub properties: Properties,
    /// Members in path order
    pub items: Vec<ContentItem>,
}

impl ContentItemGroup {
    /// The group's framework.
    #[must_use]
    pub fn framework(&self) -> Option<&Framework> {
        self.properties.get(patterns::TFM).and_then(PropertyValue::as_framework)
    }

    /// The group's runtime identifier.
    #[must_use]
    pub fn rid(&self) -> Option<&str> {
        self.properties.get(patterns::RID).and_then(PropertyValue::as_text)
    }
}

/// A path whose `{tfm}` segment is not a recognizable framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidFrameworkToken {
    /// Offending path
    pub path: String,
    /// The segment that failed to parse
    pub token: String,
}

/// Outcome of classifying every path against one set.
#[derive(Debug, Clone, Default)]
pub struct ContentMatch {
    /// Matched items in path order
    pub items: Vec<ContentItem>,
    /// Paths that matched a template apart from their framework segment
    pub invalid: Vec<InvalidFrameworkToken>,
}

/// The file list of one package.
#[derive(Debug, Clone, Default)]
pub struct ContentItemCollection {
    paths: Vec<String>,
}

/// Normalizes separators and strips leading `./` or `/`.
fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut trimmed = path.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_string()
}

impl ContentItemCollection {
    /// Loads package-relative paths. Backslashes become `/`; empty paths are skipped.
    #[must_use]
    pub fn load<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| normalize(p.as_ref()))
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Normalized paths in load order.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Classifies every path against `set`; the first matching template wins.
    #[must_use]
    pub fn find_items(&self, set: &PatternSet) -> ContentMatch {
        let mut result = ContentMatch::default();
        for path in &self.paths {
            let segments: Vec<&str> = path.split('/').collect();
            let mut invalid = None;
            let mut matched = None;
            for pattern in set.patterns() {
                match pattern.match_segments(&segments) {
                    PatternMatch::Matched(properties) => {
                        matched = Some(properties);
                        break;
                    }
                    PatternMatch::InvalidFramework(token) => {
                        invalid.get_or_insert(token);
                    }
                    PatternMatch::NoMatch => {}
                }
            }
            match (matched, invalid) {
                (Some(properties), _) => result.items.push(ContentItem {
                    path: path.clone(),
                    properties,
                }),
                (None, Some(token)) => result.invalid.push(InvalidFrameworkToken {
                    path: path.clone(),
                    token,
                }),
                (None, None) => {}
            }
        }
        result
    }

    /// Groups matched items by the set's grouping properties, in first-seen order.
    #[must_use]
    pub fn find_item_groups(&self, set: &PatternSet) -> Vec<ContentItemGroup> {
        let mut groups: Vec<ContentItemGroup> = Vec::new();
        for item in self.find_items(set).items {
            let key: Properties = set
                .grouping()
                .iter()
                .filter_map(|name| item.properties.get(name).map(|v| (name.clone(), v.clone())))
                .collect();
            match groups.iter_mut().find(|group| group.properties == key) {
                Some(group) => group.items.push(item),
                None => groups.push(ContentItemGroup {
                    properties: key,
                    items: vec![item],
                }),
            }
        }
        groups
    }

    /// Paths whose framework segment could not be parsed.
    #[must_use]
    pub fn invalid_framework_tokens(&self, set: &PatternSet) -> Vec<InvalidFrameworkToken> {
        self.find_items(set).invalid
    }

    /// Paths matched by none of `sets`.
    #[must_use]
    pub fn unmatched_paths(&self, sets: &[PatternSet]) -> Vec<&str> {
        let matched: Vec<Vec<String>> = sets
            .iter()
            .map(|set| self.find_items(set).items.into_iter().map(|i| i.path).collect())
            .collect();
        self.paths
            .iter()
            .filter(|path| !matched.iter().any(|m| m.contains(path)))
            .map(String::as_str)
            .collect()
    }

    /// The group whose framework is nearest to `target`.
    ///
    /// With a runtime identifier, groups for that rid are considered first and
    /// rid-less groups are the fallback. Without one, only rid-less groups qualify.
    #[must_use]
    pub fn find_best_item_group(
        &self,
        set: &PatternSet,
        target: &Framework,
        rid: Option<&str>,
        table: &CompatibilityTable,
    ) -> Option<ContentItemGroup> {
        let groups = self.find_item_groups(set);
        let pick = |wanted: Option<&str>| {
            let eligible: Vec<&ContentItemGroup> = groups
                .iter()
                .filter(|g| match (g.rid(), wanted) {
                    (None, None) => true,
                    (Some(have), Some(want)) => have.eq_ignore_ascii_case(want),
                    _ => false,
                })
                .collect();
            let frameworks: Vec<Framework> = eligible
                .iter()
                .map(|g| g.framework().cloned().unwrap_or_else(Framework::any))
                .collect();
            table
                .nearest_index(target, &frameworks)
                .map(|index| eligible[index].clone())
        };
        rid.and_then(|r| pick(Some(r))).or_else(|| pick(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fw(moniker: &str) -> Framework {
        Framework::parse(moniker).unwrap()
    }

    #[test]
    fn test_load_normalizes_paths() {
        let collection = ContentItemCollection::load(["\\lib\\net45\\A.dll", "./lib/x.dll", ""]);
        assert_eq!(collection.paths(), ["lib/net45/A.dll", "lib/x.dll"]);
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let collection = ContentItemCollection::load([
            "lib/netstandard2.0/A.dll",
            "lib/net45/A.dll",
            "lib/netstandard2.0/B.dll",
            "lib/net45/readme.txt",
        ]);
        let groups = collection.find_item_groups(&patterns::runtime_assemblies());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].framework(), Some(&fw("netstandard2.0")));
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[1].framework(), Some(&fw("net45")));
    }

    #[test]
    fn test_best_group_prefers_nearest_framework() {
        let table = CompatibilityTable::standard();
        let collection = ContentItemCollection::load([
            "lib/net45/A.dll",
            "lib/netstandard2.0/A.dll",
            "lib/net6.0/A.dll",
        ]);
        let set = patterns::runtime_assemblies();
        let best = |target| {
            collection
                .find_best_item_group(&set, &fw(target), None, &table)
                .and_then(|g| g.framework().cloned())
        };
        assert_eq!(best("net8.0"), Some(fw("net6.0")));
        assert_eq!(best("net472"), Some(fw("net45")));
        assert_eq!(best("netcoreapp3.1"), Some(fw("netstandard2.0")));
        assert_eq!(best("netstandard1.6"), None);
    }

    #[test]
    fn test_rid_specific_groups_win() {
        let table = CompatibilityTable::standard();
        let collection = ContentItemCollection::load([
            "runtimes/win-x64/lib/net6.0/A.dll",
            "lib/net6.0/A.dll",
        ]);
        let set = patterns::runtime_assemblies();
        let target = fw("net6.0");
        let with_rid = collection
            .find_best_item_group(&set, &target, Some("win-x64"), &table)
            .unwrap();
        assert_eq!(with_rid.rid(), Some("win-x64"));
        let other_rid = collection
            .find_best_item_group(&set, &target, Some("linux-x64"), &table)
            .unwrap();
        assert_eq!(other_rid.rid(), None);
    }

    #[test]
    fn test_invalid_framework_tokens_reported() {
        let collection = ContentItemCollection::load(["lib/bogus1.0/A.dll", "lib/net45/A.dll"]);
        let invalid = collection.invalid_framework_tokens(&patterns::runtime_assemblies());
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].token, "bogus1.0");
    }

    #[test]
    fn test_unmatched_paths() {
        let collection = ContentItemCollection::load([
            "lib/net45/A.dll",
            "tools/foo.dll",
            "build/A.targets",
            "readme.md",
        ]);
        let unmatched = collection.unmatched_paths(&patterns::asset_sets());
        assert_eq!(unmatched, ["tools/foo.dll", "readme.md"]);
    }

    #[test]
    fn test_lib_root_assembly_defaults_to_net() {
        let collection = ContentItemCollection::load(["lib/A.dll"]);
        let items = collection.find_items(&patterns::compile_lib_assemblies()).items;
        assert_eq!(items[0].framework().map(Framework::identifier), Some(".NETFramework"));
        assert_eq!(items[0].text(patterns::ASSEMBLY), Some("A.dll"));
    }
}

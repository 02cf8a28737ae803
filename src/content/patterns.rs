//! Path templates and the built-in package convention pattern sets.
//!
//! A template is a `/`-separated list of literal segments and tokens:
//!
//! | Token | Matches | Property value |
//! |-------|---------|----------------|
//! | `{tfm}` | a framework folder name (`net45`, `netstandard2.0`) | framework |
//! | `{rid}` | a runtime identifier (`win-x64`) | text |
//! | `{locale}` | a culture name (`fr`, `zh-Hans`) | text |
//! | `{codeLanguage}` | a language folder (`cs`, `vb`, `any`) | text |
//! | `{assembly}` | a `.dll`, `.exe` or `.winmd` file | text |
//! | `{satellite}` | a `.resources.dll` file | text |
//! | `{msbuild}` | a `.props` or `.targets` file | text |
//! | `{file}` | any single segment | text |
//! | `{any}` | the rest of the path (last token only) | text |
//!
//! Literal segments compare case-insensitively. A `{tfm}` segment that does not
//! parse as a framework makes the path an invalid-framework match rather than a
//! plain miss, so callers can report it.

use crate::framework::Framework;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Property name for the framework token.
pub const TFM: &str = "tfm";
/// Property name for the runtime identifier token.
pub const RID: &str = "rid";
/// Property name for the culture token.
pub const LOCALE: &str = "locale";
/// Property name for the code language token.
pub const CODE_LANGUAGE: &str = "codeLanguage";
/// Property name for the assembly token.
pub const ASSEMBLY: &str = "assembly";
/// Property name for the rest-of-path token.
pub const ANY: &str = "any";

/// A typed property captured from a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// A parsed framework
    Framework(Framework),
    /// Any other captured text
    Text(String),
}

impl PropertyValue {
    /// The framework, for framework properties.
    #[must_use]
    pub const fn as_framework(&self) -> Option<&Framework> {
        match self {
            Self::Framework(framework) => Some(framework),
            Self::Text(_) => None,
        }
    }

    /// The text, for text properties.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Framework(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Framework(framework) => write!(f, "{framework}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Captured properties keyed by token name.
pub type Properties = BTreeMap<String, PropertyValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Tfm,
    Rid,
    Locale,
    CodeLanguage,
    Assembly,
    Satellite,
    MsBuild,
    File,
    Any,
}

enum TokenMatch {
    Accepted(PropertyValue),
    InvalidFramework,
    Rejected,
}

fn has_extension(segment: &str, extensions: &[&str]) -> bool {
    let lowered = segment.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lowered.len() > ext.len() && lowered.ends_with(ext))
}

fn is_locale(segment: &str) -> bool {
    let mut parts = segment.split('-');
    let language = parts.next().unwrap_or_default();
    (2..=3).contains(&language.len())
        && language.bytes().all(|b| b.is_ascii_alphabetic())
        && parts.all(|part| {
            (1..=8).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_alphanumeric())
        })
}

impl Token {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "tfm" => Self::Tfm,
            "rid" => Self::Rid,
            "locale" => Self::Locale,
            "codeLanguage" => Self::CodeLanguage,
            "assembly" => Self::Assembly,
            "satellite" => Self::Satellite,
            "msbuild" => Self::MsBuild,
            "file" => Self::File,
            "any" => Self::Any,
            _ => return None,
        })
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Tfm => TFM,
            Self::Rid => RID,
            Self::Locale => LOCALE,
            Self::CodeLanguage => CODE_LANGUAGE,
            Self::Assembly => ASSEMBLY,
            Self::Satellite => "satellite",
            Self::MsBuild => "msbuild",
            Self::File => "file",
            Self::Any => ANY,
        }
    }

    fn accept(self, segment: &str) -> TokenMatch {
        let text = || TokenMatch::Accepted(PropertyValue::Text(segment.to_string()));
        match self {
            Self::Tfm => {
                let framework = Framework::parse_folder(segment);
                if framework.is_unsupported() {
                    TokenMatch::InvalidFramework
                } else {
                    TokenMatch::Accepted(PropertyValue::Framework(framework))
                }
            }
            Self::Rid | Self::File | Self::Any => text(),
            Self::Locale if is_locale(segment) => text(),
            Self::CodeLanguage if segment.bytes().all(|b| b.is_ascii_alphanumeric()) => {
                TokenMatch::Accepted(PropertyValue::Text(segment.to_ascii_lowercase()))
            }
            Self::Assembly if has_extension(segment, &[".dll", ".exe", ".winmd"]) => text(),
            Self::Satellite if has_extension(segment, &[".resources.dll"]) => text(),
            Self::MsBuild if has_extension(segment, &[".props", ".targets"]) => text(),
            _ => TokenMatch::Rejected,
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// Result of matching one path against one template.
pub(crate) enum PatternMatch {
    Matched(Properties),
    /// Structural match whose `{tfm}` segment is not a framework
    InvalidFramework(String),
    NoMatch,
}

/// A path template plus properties implied by it.
#[derive(Debug, Clone)]
pub struct PatternDefinition {
    template: String,
    segments: Vec<Segment>,
    defaults: Vec<(String, PropertyValue)>,
}

impl PatternDefinition {
    /// Compiles a template. Braced names that are not tokens match literally.
    #[must_use]
    pub fn new(template: &str) -> Self {
        let segments = template
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .and_then(Token::parse)
                    .map_or_else(|| Segment::Literal(segment.to_string()), Segment::Token)
            })
            .collect();
        Self {
            template: template.to_string(),
            segments,
            defaults: Vec::new(),
        }
    }

    /// Adds a property applied when the template does not capture it.
    #[must_use]
    pub fn with_default(mut self, name: &str, value: PropertyValue) -> Self {
        self.defaults.push((name.to_string(), value));
        self
    }

    /// The template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    pub(crate) fn match_segments(&self, path: &[&str]) -> PatternMatch {
        let mut properties = Properties::new();
        let mut invalid_framework = None;
        let mut index = 0;

        for (position, segment) in self.segments.iter().enumerate() {
            let is_last = position + 1 == self.segments.len();
            let Some(part) = path.get(index) else {
                return PatternMatch::NoMatch;
            };
            match segment {
                Segment::Literal(text) => {
                    if !part.eq_ignore_ascii_case(text) {
                        return PatternMatch::NoMatch;
                    }
                    index += 1;
                }
                Segment::Token(Token::Any) if is_last => {
                    properties.insert(ANY.to_string(), PropertyValue::Text(path[index..].join("/")));
                    index = path.len();
                }
                Segment::Token(token) => {
                    match token.accept(part) {
                        TokenMatch::Accepted(value) => {
                            properties.insert(token.name().to_string(), value);
                        }
                        TokenMatch::InvalidFramework => {
                            invalid_framework.get_or_insert_with(|| (*part).to_string());
                        }
                        TokenMatch::Rejected => return PatternMatch::NoMatch,
                    }
                    index += 1;
                }
            }
        }

        if index != path.len() {
            return PatternMatch::NoMatch;
        }
        if let Some(token) = invalid_framework {
            return PatternMatch::InvalidFramework(token);
        }
        for (name, value) in &self.defaults {
            properties.entry(name.clone()).or_insert_with(|| value.clone());
        }
        PatternMatch::Matched(properties)
    }
}

/// A named set of templates tried in order, plus the properties that group
/// matched items.
#[derive(Debug, Clone)]
pub struct PatternSet {
    name: String,
    grouping: Vec<String>,
    patterns: Vec<PatternDefinition>,
}

impl PatternSet {
    /// Creates a pattern set.
    #[must_use]
    pub fn new(name: &str, grouping: &[&str], patterns: Vec<PatternDefinition>) -> Self {
        Self {
            name: name.to_string(),
            grouping: grouping.iter().map(|s| (*s).to_string()).collect(),
            patterns,
        }
    }

    /// Set name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Properties that form the group key.
    #[must_use]
    pub fn grouping(&self) -> &[String] {
        &self.grouping
    }

    /// Templates in match order.
    #[must_use]
    pub fn patterns(&self) -> &[PatternDefinition] {
        &self.patterns
    }
}

fn net_default() -> PropertyValue {
    PropertyValue::Framework(Framework::parse_lenient("net"))
}

fn any_default() -> PropertyValue {
    PropertyValue::Framework(Framework::any())
}

/// Assemblies loaded at run time.
#[must_use]
pub fn runtime_assemblies() -> PatternSet {
    PatternSet::new(
        "runtime_assemblies",
        &[RID, TFM],
        vec![
            PatternDefinition::new("runtimes/{rid}/lib/{tfm}/{assembly}"),
            PatternDefinition::new("lib/{tfm}/{assembly}"),
            PatternDefinition::new("lib/{assembly}").with_default(TFM, net_default()),
        ],
    )
}

/// Reference assemblies used for compilation.
#[must_use]
pub fn compile_ref_assemblies() -> PatternSet {
    PatternSet::new(
        "compile_ref_assemblies",
        &[TFM],
        vec![PatternDefinition::new("ref/{tfm}/{assembly}")],
    )
}

/// Implementation assemblies used for compilation when no `ref` folder exists.
#[must_use]
pub fn compile_lib_assemblies() -> PatternSet {
    PatternSet::new(
        "compile_lib_assemblies",
        &[TFM],
        vec![
            PatternDefinition::new("lib/{tfm}/{assembly}"),
            PatternDefinition::new("lib/{assembly}").with_default(TFM, net_default()),
        ],
    )
}

/// Native libraries per runtime identifier.
#[must_use]
pub fn native_libraries() -> PatternSet {
    PatternSet::new(
        "native_libraries",
        &[RID, TFM],
        vec![
            PatternDefinition::new("runtimes/{rid}/nativeassets/{tfm}/{any}"),
            PatternDefinition::new("runtimes/{rid}/native/{any}").with_default(TFM, any_default()),
        ],
    )
}

/// Satellite resource assemblies.
#[must_use]
pub fn resource_assemblies() -> PatternSet {
    PatternSet::new(
        "resource_assemblies",
        &[RID, TFM],
        vec![
            PatternDefinition::new("runtimes/{rid}/lib/{tfm}/{locale}/{satellite}"),
            PatternDefinition::new("lib/{tfm}/{locale}/{satellite}"),
        ],
    )
}

/// MSBuild `.props`/`.targets` imported by direct consumers.
#[must_use]
pub fn msbuild_files() -> PatternSet {
    PatternSet::new(
        "msbuild_files",
        &[TFM],
        vec![
            PatternDefinition::new("build/{tfm}/{msbuild}"),
            PatternDefinition::new("build/{msbuild}").with_default(TFM, any_default()),
        ],
    )
}

/// MSBuild `.props`/`.targets` imported by transitive consumers.
#[must_use]
pub fn msbuild_transitive_files() -> PatternSet {
    PatternSet::new(
        "msbuild_transitive_files",
        &[TFM],
        vec![
            PatternDefinition::new("buildTransitive/{tfm}/{msbuild}"),
            PatternDefinition::new("buildTransitive/{msbuild}").with_default(TFM, any_default()),
        ],
    )
}

/// Source content files per code language.
#[must_use]
pub fn content_files() -> PatternSet {
    PatternSet::new(
        "content_files",
        &[CODE_LANGUAGE, TFM],
        vec![PatternDefinition::new("contentFiles/{codeLanguage}/{tfm}/{any}")],
    )
}

/// Tool assemblies per framework and runtime identifier.
#[must_use]
pub fn tools_assemblies() -> PatternSet {
    PatternSet::new(
        "tools_assemblies",
        &[TFM, RID],
        vec![PatternDefinition::new("tools/{tfm}/{rid}/{any}")],
    )
}

/// Every file below a `lib/{tfm}` folder.
#[must_use]
pub fn lib_folders() -> PatternSet {
    PatternSet::new("lib_folders", &[TFM], vec![PatternDefinition::new("lib/{tfm}/{any}")])
}

/// Every file below a `ref/{tfm}` folder.
#[must_use]
pub fn ref_folders() -> PatternSet {
    PatternSet::new("ref_folders", &[TFM], vec![PatternDefinition::new("ref/{tfm}/{any}")])
}

/// Every file below a `build/{tfm}` folder.
#[must_use]
pub fn build_folders() -> PatternSet {
    PatternSet::new("build_folders", &[TFM], vec![PatternDefinition::new("build/{tfm}/{any}")])
}

/// The asset pattern sets, in the order they classify files.
#[must_use]
pub fn asset_sets() -> Vec<PatternSet> {
    vec![
        runtime_assemblies(),
        compile_ref_assemblies(),
        compile_lib_assemblies(),
        native_libraries(),
        resource_assemblies(),
        msbuild_files(),
        msbuild_transitive_files(),
        content_files(),
        tools_assemblies(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(pattern: &str, path: &str) -> Option<Properties> {
        let segments: Vec<&str> = path.split('/').collect();
        match PatternDefinition::new(pattern).match_segments(&segments) {
            PatternMatch::Matched(properties) => Some(properties),
            _ => None,
        }
    }

    #[test]
    fn test_tokens_capture_properties() {
        let props = matched("runtimes/{rid}/lib/{tfm}/{assembly}", "runtimes/win-x64/lib/net6.0/a.dll").unwrap();
        assert_eq!(props[RID], PropertyValue::Text("win-x64".into()));
        assert_eq!(props[TFM], PropertyValue::Framework(Framework::parse("net6.0").unwrap()));
        assert_eq!(props[ASSEMBLY], PropertyValue::Text("a.dll".into()));
    }

    #[test]
    fn test_literals_are_case_insensitive() {
        assert!(matched("lib/{tfm}/{assembly}", "LIB/net45/a.DLL").is_some());
        assert!(matched("lib/{tfm}/{assembly}", "lib/net45/a.txt").is_none());
        assert!(matched("lib/{tfm}/{assembly}", "lib/net45/sub/a.dll").is_none());
    }

    #[test]
    fn test_any_consumes_rest() {
        let props = matched("lib/{tfm}/{any}", "lib/net45/sub/dir/a.xml").unwrap();
        assert_eq!(props[ANY].as_text(), Some("sub/dir/a.xml"));
        assert!(matched("lib/{tfm}/{any}", "lib/net45").is_none());
    }

    #[test]
    fn test_invalid_framework_is_distinguished() {
        let segments = ["lib", "notaframework", "a.dll"];
        assert!(matches!(
            PatternDefinition::new("lib/{tfm}/{assembly}").match_segments(&segments),
            PatternMatch::InvalidFramework(token) if token == "notaframework"
        ));
    }

    #[test]
    fn test_defaults_fill_missing_properties() {
        let props = matched("lib/{assembly}", "lib/a.dll").unwrap();
        assert_eq!(props[TFM].as_framework(), Framework::parse("net").ok().as_ref());

        let pattern = PatternDefinition::new("build/{msbuild}").with_default(TFM, any_default());
        assert_eq!(pattern.template(), "build/{msbuild}");
    }

    #[test]
    fn test_locale_and_satellite() {
        assert!(matched("lib/{tfm}/{locale}/{satellite}", "lib/net45/zh-Hans/a.resources.dll").is_some());
        assert!(matched("lib/{tfm}/{locale}/{satellite}", "lib/net45/not_a_locale/a.resources.dll").is_none());
        assert!(matched("lib/{tfm}/{locale}/{satellite}", "lib/net45/fr/a.dll").is_none());
    }
}

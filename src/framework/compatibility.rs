//! Framework compatibility rules and nearest-framework selection.
//!
//! Same-family compatibility (`net45` assets in a `net472` project) and the
//! sentinel rules are fixed. Everything that crosses framework families lives in a
//! mapping table of [`CompatibilityMapping`] entries, so callers can inspect the
//! table, replace it in tests, or extend it from configuration:
//!
//! ```toml
//! [[frameworks.mappings]]
//! target = "tizen6.0"
//! supported = "netstandard2.1"
//! steps = 2
//! ```

use super::identifiers::{
    MONO_ANDROID, MONO_TOUCH, NET_CORE, NET_CORE_APP, NET_FRAMEWORK, NET_STANDARD, TIZEN, UAP,
    WINDOWS, WINDOWS_PHONE, WINDOWS_PHONE_APP, XAMARIN_IOS, XAMARIN_MAC,
};
use super::{Framework, FrameworkVersion};
use serde::{Deserialize, Serialize};

/// Generalization steps for a portable candidate.
pub const PORTABLE_STEPS: u8 = 3;
/// Generalization steps for an `Any` or `Agnostic` candidate.
pub const ANY_STEPS: u8 = 4;

const fn default_steps() -> u8 {
    1
}

/// One cross-family compatibility edge.
///
/// Projects of `target`'s family at or above `target`'s version (and on
/// `target`'s platform, when it names one) may consume assets of `supported`'s
/// family up to and including `supported`'s version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityMapping {
    /// Lowest project framework covered by this mapping
    pub target: Framework,
    /// Highest consumable framework of the other family
    pub supported: Framework,
    /// Generalization distance used to rank candidates (concrete platforms 1,
    /// .NET Standard 2)
    #[serde(default = "default_steps")]
    pub steps: u8,
}

impl CompatibilityMapping {
    /// Creates a mapping.
    #[must_use]
    pub const fn new(target: Framework, supported: Framework, steps: u8) -> Self {
        Self {
            target,
            supported,
            steps,
        }
    }

    fn covers_target(&self, project: &Framework) -> bool {
        if !project.same_family(&self.target) || project.version() < self.target.version() {
            return false;
        }
        match self.target.platform() {
            Some(platform) => project
                .platform()
                .is_some_and(|p| p.eq_ignore_ascii_case(platform)),
            None => true,
        }
    }

    fn covers_candidate(&self, candidate: &Framework) -> bool {
        candidate.same_family(&self.supported)
            && candidate.version() <= self.supported.version()
            && candidate.platform().is_none()
    }
}

fn mapping(
    target: &str,
    target_version: [u32; 4],
    supported: &str,
    supported_version: [u32; 4],
    steps: u8,
) -> CompatibilityMapping {
    CompatibilityMapping::new(
        Framework::new(target, FrameworkVersion::from_parts(target_version)),
        Framework::new(supported, FrameworkVersion::from_parts(supported_version)),
        steps,
    )
}

/// The built-in cross-family mappings.
#[must_use]
pub fn default_mappings() -> Vec<CompatibilityMapping> {
    const CONCRETE: u8 = 1;
    const STANDARD: u8 = 2;
    vec![
        // .NET Standard support by platform
        mapping(NET_CORE_APP, [1, 0, 0, 0], NET_STANDARD, [1, 6, 0, 0], STANDARD),
        mapping(NET_CORE_APP, [2, 0, 0, 0], NET_STANDARD, [2, 0, 0, 0], STANDARD),
        mapping(NET_CORE_APP, [3, 0, 0, 0], NET_STANDARD, [2, 1, 0, 0], STANDARD),
        mapping(NET_FRAMEWORK, [4, 5, 0, 0], NET_STANDARD, [1, 1, 0, 0], STANDARD),
        mapping(NET_FRAMEWORK, [4, 5, 1, 0], NET_STANDARD, [1, 2, 0, 0], STANDARD),
        mapping(NET_FRAMEWORK, [4, 6, 0, 0], NET_STANDARD, [1, 3, 0, 0], STANDARD),
        mapping(NET_FRAMEWORK, [4, 6, 1, 0], NET_STANDARD, [2, 0, 0, 0], STANDARD),
        mapping(UAP, [10, 0, 0, 0], NET_STANDARD, [1, 4, 0, 0], STANDARD),
        mapping(UAP, [10, 0, 16299, 0], NET_STANDARD, [2, 0, 0, 0], STANDARD),
        mapping(NET_CORE, [4, 5, 0, 0], NET_STANDARD, [1, 1, 0, 0], STANDARD),
        mapping(NET_CORE, [4, 5, 1, 0], NET_STANDARD, [1, 2, 0, 0], STANDARD),
        mapping(NET_CORE, [5, 0, 0, 0], NET_STANDARD, [1, 4, 0, 0], STANDARD),
        mapping(WINDOWS, [8, 0, 0, 0], NET_STANDARD, [1, 1, 0, 0], STANDARD),
        mapping(WINDOWS, [8, 1, 0, 0], NET_STANDARD, [1, 2, 0, 0], STANDARD),
        mapping(WINDOWS_PHONE_APP, [8, 1, 0, 0], NET_STANDARD, [1, 2, 0, 0], STANDARD),
        mapping(WINDOWS_PHONE, [8, 0, 0, 0], NET_STANDARD, [1, 0, 0, 0], STANDARD),
        mapping(MONO_ANDROID, [0, 0, 0, 0], NET_STANDARD, [2, 1, 0, 0], STANDARD),
        mapping(MONO_TOUCH, [0, 0, 0, 0], NET_STANDARD, [2, 1, 0, 0], STANDARD),
        mapping(XAMARIN_IOS, [0, 0, 0, 0], NET_STANDARD, [2, 1, 0, 0], STANDARD),
        mapping(XAMARIN_MAC, [0, 0, 0, 0], NET_STANDARD, [2, 1, 0, 0], STANDARD),
        mapping(TIZEN, [3, 0, 0, 0], NET_STANDARD, [1, 6, 0, 0], STANDARD),
        mapping(TIZEN, [4, 0, 0, 0], NET_STANDARD, [2, 0, 0, 0], STANDARD),
        // Concrete platform equivalences
        mapping(UAP, [10, 0, 0, 0], WINDOWS, [8, 1, 0, 0], CONCRETE),
        mapping(UAP, [10, 0, 0, 0], WINDOWS_PHONE_APP, [8, 1, 0, 0], CONCRETE),
        mapping(UAP, [10, 0, 0, 0], NET_CORE, [5, 0, 0, 0], CONCRETE),
        mapping(WINDOWS, [8, 0, 0, 0], NET_CORE, [4, 5, 0, 0], CONCRETE),
        mapping(WINDOWS, [8, 1, 0, 0], NET_CORE, [4, 5, 1, 0], CONCRETE),
        mapping(WINDOWS_PHONE_APP, [8, 1, 0, 0], NET_CORE, [4, 5, 1, 0], CONCRETE),
        mapping(MONO_TOUCH, [0, 0, 0, 0], XAMARIN_IOS, [1, 0, 0, 0], CONCRETE),
    ]
}

/// Ranking of a compatible candidate; lower tiers are nearer.
#[derive(Debug, Clone, Copy)]
struct Closeness {
    tier: u8,
    platform_match: bool,
    version: FrameworkVersion,
    platform_version: FrameworkVersion,
    portable_width: usize,
}

impl Closeness {
    /// Strictly nearer than `other`; ties keep the earlier candidate.
    fn is_nearer_than(&self, other: &Self) -> bool {
        if self.tier != other.tier {
            return self.tier < other.tier;
        }
        if self.platform_match != other.platform_match {
            return self.platform_match;
        }
        if self.version != other.version {
            return self.version > other.version;
        }
        if self.platform_version != other.platform_version {
            return self.platform_version > other.platform_version;
        }
        self.portable_width < other.portable_width
    }
}

/// Answers framework compatibility questions from a mapping table.
#[derive(Debug, Clone)]
pub struct CompatibilityTable {
    mappings: Vec<CompatibilityMapping>,
}

impl Default for CompatibilityTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl CompatibilityTable {
    /// Table holding the built-in mappings.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            mappings: default_mappings(),
        }
    }

    /// Table without cross-family mappings.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            mappings: Vec::new(),
        }
    }

    /// Returns this table with additional mappings appended.
    #[must_use]
    pub fn with_mappings<I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = CompatibilityMapping>,
    {
        self.mappings.extend(extra);
        self
    }

    /// The mappings in evaluation order.
    #[must_use]
    pub fn mappings(&self) -> &[CompatibilityMapping] {
        &self.mappings
    }

    /// Whether an asset built for `candidate` can be consumed by a project
    /// targeting `target`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use nuresolve_cli::framework::{CompatibilityTable, Framework};
    ///
    /// let table = CompatibilityTable::standard();
    /// let net472 = Framework::parse("net472")?;
    /// assert!(table.is_compatible(&Framework::parse("netstandard2.0")?, &net472));
    /// assert!(!table.is_compatible(&Framework::parse("netstandard2.1")?, &net472));
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn is_compatible(&self, candidate: &Framework, target: &Framework) -> bool {
        if candidate == target {
            return true;
        }
        if candidate.is_unsupported() || target.is_unsupported() {
            return false;
        }
        if candidate.is_any() || candidate.is_agnostic() {
            return true;
        }
        if !target.is_specific() {
            return false;
        }
        if target.is_portable() {
            // A portable project runs everywhere its members run.
            let members = target.portable_members();
            return !members.is_empty()
                && members.iter().all(|member| self.is_compatible(candidate, member));
        }
        if candidate.is_portable() {
            return candidate
                .portable_members()
                .iter()
                .any(|member| self.is_compatible(member, target));
        }
        if candidate.same_family(target) {
            return same_family_compatible(candidate, target);
        }
        self.mapping_steps(candidate, target).is_some()
    }

    /// Whether `candidate` is compatible with every framework in `targets`.
    #[must_use]
    pub fn is_compatible_with_all(&self, candidate: &Framework, targets: &[Framework]) -> bool {
        targets.iter().all(|target| self.is_compatible(candidate, target))
    }

    /// Fewest steps of any mapping connecting `candidate` to `target`.
    fn mapping_steps(&self, candidate: &Framework, target: &Framework) -> Option<u8> {
        self.mappings
            .iter()
            .filter(|m| m.covers_target(target) && m.covers_candidate(candidate))
            .map(|m| m.steps)
            .min()
    }

    fn closeness(&self, target: &Framework, candidate: &Framework) -> Option<Closeness> {
        if !self.is_compatible(candidate, target) {
            return None;
        }
        let tier = if candidate == target {
            0
        } else if candidate.is_any() || candidate.is_agnostic() {
            2 + ANY_STEPS
        } else if candidate.is_portable() {
            2 + PORTABLE_STEPS
        } else if candidate.same_family(target) {
            1
        } else {
            2 + self.mapping_steps(candidate, target).unwrap_or(PORTABLE_STEPS)
        };
        let platform_match = match (candidate.platform(), target.platform()) {
            (Some(c), Some(t)) => c.eq_ignore_ascii_case(t),
            _ => false,
        };
        Some(Closeness {
            tier,
            platform_match,
            version: candidate.version(),
            platform_version: candidate.platform_version(),
            portable_width: candidate.portable_members().len(),
        })
    }

    /// Position of the nearest compatible candidate.
    #[must_use]
    pub fn nearest_index(&self, target: &Framework, candidates: &[Framework]) -> Option<usize> {
        let mut best: Option<(usize, Closeness)> = None;
        for (index, candidate) in candidates.iter().enumerate() {
            let Some(closeness) = self.closeness(target, candidate) else {
                continue;
            };
            match &best {
                Some((_, current)) if !closeness.is_nearer_than(current) => {}
                _ => best = Some((index, closeness)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Nearest candidate compatible with `target`.
    ///
    /// Preference order: exact match; same family with the highest version
    /// (platform-specific first); fewest mapping steps with the highest version;
    /// portable profiles with the fewest members; `Any`. Remaining ties keep the
    /// first candidate in input order. Returns `None` when nothing is compatible.
    #[must_use]
    pub fn get_nearest<'a>(
        &self,
        target: &Framework,
        candidates: &'a [Framework],
    ) -> Option<&'a Framework> {
        self.nearest_index(target, candidates).map(|index| &candidates[index])
    }
}

fn normalized_profile(framework: &Framework) -> Option<String> {
    match framework.profile().map(str::to_ascii_lowercase) {
        Some(profile) if profile == "client" || profile == "full" => None,
        other => other,
    }
}

fn same_family_compatible(candidate: &Framework, target: &Framework) -> bool {
    if normalized_profile(candidate) != normalized_profile(target) {
        return false;
    }
    if candidate.version() > target.version() {
        return false;
    }
    match (candidate.platform(), target.platform()) {
        (None, _) => true,
        (Some(c), Some(t)) if c.eq_ignore_ascii_case(t) => {
            candidate.platform_version() <= target.platform_version()
        }
        _ => false,
    }
}

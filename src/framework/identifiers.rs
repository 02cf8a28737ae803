//! Known framework identifiers and their short folder names.

/// `.NETFramework` (`net472`)
pub const NET_FRAMEWORK: &str = ".NETFramework";
/// `.NETCoreApp` (`netcoreapp3.1`, `net6.0`)
pub const NET_CORE_APP: &str = ".NETCoreApp";
/// `.NETStandard` (`netstandard2.0`)
pub const NET_STANDARD: &str = ".NETStandard";
/// `.NETCore` (`netcore50`), the legacy store app framework
pub const NET_CORE: &str = ".NETCore";
/// `.NETPortable` (`portable-net45+win8`)
pub const NET_PORTABLE: &str = ".NETPortable";
/// `.NETMicroFramework` (`netmf`)
pub const NET_MICRO_FRAMEWORK: &str = ".NETMicroFramework";
/// `DNXCore` (`dnxcore50`)
pub const DNX_CORE: &str = "DNXCore";
/// `UAP` (`uap10.0`)
pub const UAP: &str = "UAP";
/// `Windows` (`win8`, `win81`)
pub const WINDOWS: &str = "Windows";
/// `WindowsPhone` (`wp8`)
pub const WINDOWS_PHONE: &str = "WindowsPhone";
/// `WindowsPhoneApp` (`wpa81`)
pub const WINDOWS_PHONE_APP: &str = "WindowsPhoneApp";
/// `Silverlight` (`sl5`)
pub const SILVERLIGHT: &str = "Silverlight";
/// `MonoAndroid` (`monoandroid10`)
pub const MONO_ANDROID: &str = "MonoAndroid";
/// `MonoTouch` (`monotouch`)
pub const MONO_TOUCH: &str = "MonoTouch";
/// `Xamarin.iOS` (`xamarinios`)
pub const XAMARIN_IOS: &str = "Xamarin.iOS";
/// `Xamarin.Mac` (`xamarinmac`)
pub const XAMARIN_MAC: &str = "Xamarin.Mac";
/// `Tizen` (`tizen40`)
pub const TIZEN: &str = "Tizen";
/// `native` C++ packages
pub const NATIVE: &str = "native";
/// Matches every project
pub const ANY: &str = "Any";
/// Framework independent content
pub const AGNOSTIC: &str = "Agnostic";
/// Unparseable or unknown moniker
pub const UNSUPPORTED: &str = "Unsupported";

/// How a version is written after the short name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VersionStyle {
    /// One digit per part: `net472`, `win81`; keeps at least this many parts
    Compact(usize),
    /// Dot separated: `netstandard2.0`, `uap10.0`
    Dotted,
    /// No version is written
    None,
}

#[derive(Debug)]
pub(crate) struct KnownIdentifier {
    pub short: &'static str,
    pub full: &'static str,
    pub style: VersionStyle,
}

const fn known(short: &'static str, full: &'static str, style: VersionStyle) -> KnownIdentifier {
    KnownIdentifier { short, full, style }
}

pub(crate) const KNOWN_IDENTIFIERS: &[KnownIdentifier] = &[
    known("netstandard", NET_STANDARD, VersionStyle::Dotted),
    known("netcoreapp", NET_CORE_APP, VersionStyle::Dotted),
    known("monoandroid", MONO_ANDROID, VersionStyle::Compact(2)),
    known("xamarinios", XAMARIN_IOS, VersionStyle::Compact(1)),
    known("xamarinmac", XAMARIN_MAC, VersionStyle::Compact(1)),
    known("monotouch", MONO_TOUCH, VersionStyle::Compact(1)),
    known("portable", NET_PORTABLE, VersionStyle::None),
    known("dnxcore", DNX_CORE, VersionStyle::Compact(2)),
    known("netcore", NET_CORE, VersionStyle::Compact(2)),
    known("native", NATIVE, VersionStyle::None),
    known("netmf", NET_MICRO_FRAMEWORK, VersionStyle::Compact(1)),
    known("tizen", TIZEN, VersionStyle::Compact(2)),
    known("net", NET_FRAMEWORK, VersionStyle::Compact(2)),
    known("uap", UAP, VersionStyle::Dotted),
    known("wpa", WINDOWS_PHONE_APP, VersionStyle::Compact(1)),
    known("win", WINDOWS, VersionStyle::Compact(1)),
    known("wp", WINDOWS_PHONE, VersionStyle::Compact(1)),
    known("sl", SILVERLIGHT, VersionStyle::Compact(1)),
];

/// Looks up a short folder name such as `netstandard` (case-insensitive).
pub(crate) fn by_short_name(short: &str) -> Option<&'static KnownIdentifier> {
    KNOWN_IDENTIFIERS
        .iter()
        .find(|known| known.short.eq_ignore_ascii_case(short))
}

/// Looks up a full identifier such as `.NETStandard` (case-insensitive).
pub(crate) fn by_full_name(full: &str) -> Option<&'static KnownIdentifier> {
    KNOWN_IDENTIFIERS
        .iter()
        .find(|known| known.full.eq_ignore_ascii_case(full))
}

/// Canonical casing for a full identifier, including the sentinels.
pub(crate) fn canonical_full_name(full: &str) -> Option<&'static str> {
    by_full_name(full)
        .map(|known| known.full)
        .or_else(|| [ANY, AGNOSTIC, UNSUPPORTED].into_iter().find(|s| s.eq_ignore_ascii_case(full)))
}

/// Closest known short name within edit distance two, for "did you mean" hints.
pub(crate) fn suggest_short_name(unknown: &str) -> Option<&'static str> {
    let lowered = unknown.to_ascii_lowercase();
    KNOWN_IDENTIFIERS
        .iter()
        .map(|known| (known.short, strsim::levenshtein(&lowered, known.short)))
        .filter(|(_, distance)| *distance > 0 && *distance <= 2)
        .min_by_key(|(_, distance)| *distance)
        .map(|(short, _)| short)
}

use super::identifiers::{NET_CORE_APP, NET_FRAMEWORK, NET_STANDARD};
use super::*;

fn fw(moniker: &str) -> Framework {
    Framework::parse(moniker).unwrap()
}

fn frameworks(monikers: &[&str]) -> Vec<Framework> {
    monikers.iter().map(|m| fw(m)).collect()
}

#[test]
fn test_parse_compact_and_dotted() {
    let net472 = fw("net472");
    assert_eq!(net472.identifier(), NET_FRAMEWORK);
    assert_eq!(net472.version(), FrameworkVersion::from_parts([4, 7, 2, 0]));

    assert_eq!(fw("netstandard2.0"), Framework::new(NET_STANDARD, FrameworkVersion::new(2, 0)));
    assert_eq!(fw("netstandard20"), fw("netstandard2.0"));
    assert_eq!(fw("netcoreapp3.1").version(), FrameworkVersion::new(3, 1));
    assert_eq!(fw("NET45"), fw("net45"));
}

#[test]
fn test_parse_net5_era() {
    let net6 = fw("net6.0");
    assert_eq!(net6.identifier(), NET_CORE_APP);
    assert!(net6.is_net5_era());
    assert_eq!(net6.short_folder_name(), "net6.0");

    let windows = fw("net6.0-windows10.0.19041");
    assert_eq!(windows.platform(), Some("windows"));
    assert_eq!(windows.platform_version(), FrameworkVersion::from_parts([10, 0, 19041, 0]));
    assert_eq!(windows.short_folder_name(), "net6.0-windows10.0.19041");

    assert_eq!(fw("net5.0-android").platform_version(), FrameworkVersion::ZERO);
}

#[test]
fn test_parse_profiles_and_portable() {
    let client = fw("net40-client");
    assert_eq!(client.profile(), Some("client"));
    assert_eq!(client.short_folder_name(), "net40-client");

    let portable = fw("portable-win8+net45");
    assert!(portable.is_portable());
    assert_eq!(portable.short_folder_name(), "portable-net45+win8");
    assert_eq!(portable.portable_members(), frameworks(&["net45", "win8"]));
}

#[test]
fn test_parse_long_form() {
    assert_eq!(fw(".NETStandard2.0"), fw("netstandard2.0"));
    assert_eq!(fw(".NETFramework,Version=v4.7.2"), fw("net472"));
    assert_eq!(fw(".NETFramework,Version=v4.0,Profile=Client"), fw("net40-client"));
    assert_eq!(fw(".NETCoreApp,Version=v6.0"), fw("net6.0"));
    assert_eq!(fw("net472").full_name(), ".NETFramework,Version=v4.7.2");
}

#[test]
fn test_parse_sentinels() {
    assert!(fw("any").is_any());
    assert!(fw("Agnostic").is_agnostic());
    assert_eq!(fw("native").short_folder_name(), "native");
}

#[test]
fn test_strict_parse_errors() {
    assert_eq!(Framework::parse(""), Err(FrameworkParseError::Empty));
    match Framework::parse("netstandrd2.0") {
        Err(FrameworkParseError::UnknownIdentifier { identifier, suggestion, .. }) => {
            assert_eq!(identifier, "netstandrd");
            assert_eq!(suggestion.as_deref(), Some("netstandard"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(Framework::parse("net4x"), Err(FrameworkParseError::Malformed { .. })));
    assert!(matches!(Framework::parse("4.5"), Err(FrameworkParseError::Malformed { .. })));
    assert!(matches!(Framework::parse("net6.0-"), Err(FrameworkParseError::Malformed { .. })));
    assert!(Framework::parse("native1.0").is_err());
}

#[test]
fn test_lenient_parse_maps_to_unsupported() {
    assert!(Framework::parse_lenient("foo").is_unsupported());
    assert!(Framework::parse_folder("sub").is_unsupported());
    assert!(Framework::parse_folder(".NETStandard2.0").is_unsupported());
    assert_eq!(Framework::parse_folder("net45"), fw("net45"));
}

#[test]
fn test_short_folder_name_round_trips() {
    for moniker in [
        "net20", "net35", "net40", "net45", "net472", "net48", "netstandard1.3", "netstandard2.1",
        "netcoreapp2.2", "net5.0", "net8.0-ios17.0", "uap10.0", "win8", "win81", "wpa81", "sl5",
        "monoandroid10", "xamarinios", "tizen40", "netcore50", "portable-net45+win8",
    ] {
        assert_eq!(fw(moniker).short_folder_name(), moniker);
        assert_eq!(fw(&fw(moniker).short_folder_name()), fw(moniker));
    }
}

#[test]
fn test_equality_is_case_insensitive() {
    use std::collections::HashSet;

    let set: HashSet<Framework> = frameworks(&["NET6.0-Windows", "net6.0-windows"]).into_iter().collect();
    assert_eq!(set.len(), 1);
    assert_ne!(fw("net40"), fw("net40-client"));
}

#[test]
fn test_compatibility_is_reflexive() {
    let table = CompatibilityTable::standard();
    for framework in frameworks(&[
        "net45", "net6.0-windows10.0.19041", "netstandard2.0", "portable-net45+win8", "any", "native",
        "net40-client", "uap10.0",
    ])
    .into_iter()
    .chain([Framework::unsupported(), Framework::agnostic()])
    {
        assert!(table.is_compatible(&framework, &framework), "{framework} should accept itself");
    }
}

#[test]
fn test_same_family_compatibility() {
    let table = CompatibilityTable::standard();
    assert!(table.is_compatible(&fw("net45"), &fw("net472")));
    assert!(!table.is_compatible(&fw("net472"), &fw("net45")));
    assert!(table.is_compatible(&fw("net5.0"), &fw("net6.0")));
    assert!(table.is_compatible(&fw("netcoreapp3.1"), &fw("net6.0")));
    assert!(table.is_compatible(&fw("net40-client"), &fw("net45")));
}

#[test]
fn test_platform_compatibility() {
    let table = CompatibilityTable::standard();
    let project = fw("net6.0-windows10.0.19041");
    assert!(table.is_compatible(&fw("net6.0"), &project));
    assert!(table.is_compatible(&fw("net6.0-windows"), &project));
    assert!(table.is_compatible(&fw("net6.0-windows10.0.17763"), &project));
    assert!(!table.is_compatible(&fw("net6.0-windows10.0.22000"), &project));
    assert!(!table.is_compatible(&fw("net6.0-android"), &project));
    assert!(!table.is_compatible(&fw("net6.0-windows"), &fw("net6.0")));
}

#[test]
fn test_standard_compatibility() {
    let table = CompatibilityTable::standard();
    assert!(table.is_compatible(&fw("netstandard2.0"), &fw("net461")));
    assert!(!table.is_compatible(&fw("netstandard2.1"), &fw("net48")));
    assert!(table.is_compatible(&fw("netstandard2.1"), &fw("net6.0-windows")));
    assert!(table.is_compatible(&fw("netstandard1.6"), &fw("netcoreapp1.0")));
    assert!(table.is_compatible(&fw("netstandard2.0"), &fw("tizen40")));
    assert!(table.is_compatible(&fw("win81"), &fw("uap10.0")));
    assert!(!table.is_compatible(&fw("net6.0"), &fw("netstandard2.1")));
}

#[test]
fn test_sentinel_compatibility() {
    let table = CompatibilityTable::standard();
    assert!(table.is_compatible(&Framework::any(), &fw("net45")));
    assert!(table.is_compatible(&Framework::agnostic(), &fw("uap10.0")));
    assert!(!table.is_compatible(&Framework::unsupported(), &fw("net45")));
    assert!(!table.is_compatible(&fw("net45"), &Framework::unsupported()));
    assert!(!table.is_compatible(&fw("net45"), &Framework::any()));
}

#[test]
fn test_portable_compatibility() {
    let table = CompatibilityTable::standard();
    let portable = fw("portable-net45+win8");
    assert!(table.is_compatible(&portable, &fw("net472")));
    assert!(table.is_compatible(&portable, &fw("uap10.0")));
    assert!(!table.is_compatible(&portable, &fw("net40")));
    assert!(table.is_compatible(&fw("netstandard1.1"), &portable));
    assert!(!table.is_compatible(&fw("net45"), &portable));
}

#[test]
fn test_mappings_are_data() {
    let project = fw("tizen6.0");
    let asset = fw("netstandard2.1");
    assert!(!CompatibilityTable::standard().is_compatible(&asset, &project));

    let extended = CompatibilityTable::standard()
        .with_mappings([CompatibilityMapping::new(fw("tizen6.0"), fw("netstandard2.1"), 2)]);
    assert!(extended.is_compatible(&asset, &project));

    assert!(!CompatibilityTable::empty().is_compatible(&fw("netstandard2.0"), &fw("net472")));
}

#[test]
fn test_mapping_deserializes_from_toml() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        mappings: Vec<CompatibilityMapping>,
    }
    let parsed: Wrapper = toml::from_str(
        r#"
        [[mappings]]
        target = "tizen6.0"
        supported = "netstandard2.1"
        "#,
    )
    .unwrap();
    assert_eq!(parsed.mappings[0].steps, 1);
    assert_eq!(parsed.mappings[0].supported, fw("netstandard2.1"));
}

#[test]
fn test_nearest_prefers_exact_then_family() {
    let table = CompatibilityTable::standard();
    let candidates = frameworks(&["netstandard2.0", "net45", "net472", "net48"]);
    assert_eq!(table.get_nearest(&fw("net472"), &candidates), Some(&candidates[2]));
    assert_eq!(table.get_nearest(&fw("net471"), &candidates), Some(&candidates[1]));

    let core = frameworks(&["netstandard2.1", "netcoreapp3.1", "net5.0"]);
    assert_eq!(table.get_nearest(&fw("net6.0"), &core), Some(&core[2]));
}

#[test]
fn test_nearest_prefers_platform_specific() {
    let table = CompatibilityTable::standard();
    let candidates = frameworks(&["net6.0", "net5.0-windows", "net6.0-windows7.0"]);
    assert_eq!(
        table.get_nearest(&fw("net6.0-windows10.0.19041"), &candidates),
        Some(&candidates[2])
    );
}

#[test]
fn test_nearest_steps_then_version() {
    let table = CompatibilityTable::standard();
    let candidates = frameworks(&["any", "portable-net45+win8+wpa81", "portable-net45+win8", "netstandard1.4", "netstandard1.0"]);
    assert_eq!(table.get_nearest(&fw("uap10.0"), &candidates), Some(&candidates[3]));

    let with_concrete = frameworks(&["netstandard1.4", "win81"]);
    assert_eq!(table.get_nearest(&fw("uap10.0"), &with_concrete), Some(&with_concrete[1]));

    let portables = frameworks(&["any", "portable-net45+win8+wpa81", "portable-net45+win8"]);
    assert_eq!(table.get_nearest(&fw("net472"), &portables), Some(&portables[2]));
}

#[test]
fn test_nearest_ties_keep_input_order() {
    let table = CompatibilityTable::standard();
    let candidates = frameworks(&["net40-client", "net40"]);
    assert_eq!(table.nearest_index(&fw("net45"), &candidates), Some(0));
    let reversed = frameworks(&["net40", "net40-client"]);
    assert_eq!(table.nearest_index(&fw("net45"), &reversed), Some(0));
}

#[test]
fn test_nearest_empty_and_incompatible() {
    let table = CompatibilityTable::standard();
    assert_eq!(table.get_nearest(&fw("net45"), &[]), None);
    assert_eq!(table.get_nearest(&fw("net45"), &frameworks(&["net6.0", "netstandard2.0"])), None);
}

use super::*;
use clap::CommandFactory;

#[test]
fn test_cli_definition() {
    Cli::command().debug_assert();
}

#[test]
fn test_log_filter() {
    let cli = Cli::try_parse_from(["nuresolve", "nearest", "net6.0", "net472"]).unwrap();
    assert_eq!(cli.log_filter(), "warn");

    let cli = Cli::try_parse_from(["nuresolve", "-v", "nearest", "net6.0", "net472"]).unwrap();
    assert_eq!(cli.log_filter(), "debug");

    let cli = Cli::try_parse_from(["nuresolve", "nearest", "--quiet", "net6.0", "net472"]).unwrap();
    assert_eq!(cli.log_filter(), "error");
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    assert!(Cli::try_parse_from(["nuresolve", "-v", "-q", "nearest", "net6.0", "net472"]).is_err());
}

#[test]
fn test_resolve_arguments() {
    let cli = Cli::try_parse_from([
        "nuresolve",
        "resolve",
        "project.toml",
        "--feed",
        "feed",
        "--framework",
        "net6.0",
        "--framework",
        "net472",
        "--format",
        "json",
        "--tree",
    ])
    .unwrap();
    let Commands::Resolve(cmd) = cli.command else {
        panic!("expected resolve");
    };
    assert_eq!(cmd.request, PathBuf::from("project.toml"));
    assert_eq!(cmd.feed, PathBuf::from("feed"));
    assert_eq!(cmd.frameworks, vec!["net6.0", "net472"]);
    assert_eq!(cmd.format, OutputFormat::Json);
    assert!(cmd.tree);
}

#[test]
fn test_resolve_feed_default() {
    let cli = Cli::try_parse_from(["nuresolve", "resolve", "project.toml"]).unwrap();
    let Commands::Resolve(cmd) = cli.command else {
        panic!("expected resolve");
    };
    assert_eq!(cmd.feed, PathBuf::from("packages"));
    assert_eq!(cmd.format, OutputFormat::Text);
}

#[test]
fn test_nearest_requires_candidates() {
    assert!(Cli::try_parse_from(["nuresolve", "nearest", "net6.0"]).is_err());
}

#[tokio::test]
async fn test_missing_explicit_config() {
    let cli = Cli::try_parse_from([
        "nuresolve",
        "--config",
        "/nonexistent/nuresolve.toml",
        "nearest",
        "net6.0",
        "net472",
    ])
    .unwrap();
    let err = cli.execute().await.unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
}

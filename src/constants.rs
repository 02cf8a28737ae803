//! Constants shared across the nuresolve codebase.
//!
//! Defaults that more than one module depends on live here so configuration,
//! the resolver and the package rules agree on them.

/// Default bound on in-flight provider calls per resolution pass.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Name of the empty marker file that keeps an otherwise empty folder in a package.
pub const PLACEHOLDER_FILE_NAME: &str = "_._";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "NURESOLVE_CONFIG";

/// Directory under the home directory holding user configuration.
pub const CONFIG_DIR_NAME: &str = ".nuresolve";

/// Configuration file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Package folders whose assemblies are consumed by the build or runtime.
///
/// An assembly outside all of these is reported as misplaced.
pub const ASSET_FOLDERS: &[&str] = &[
    "lib",
    "ref",
    "runtimes",
    "analyzers",
    "build",
    "buildTransitive",
    "buildCrossTargeting",
    "native",
];

/// File extensions treated as assemblies.
pub const ASSEMBLY_EXTENSIONS: &[&str] = &[".dll", ".exe", ".winmd"];

//! Assembly placement rules.

use super::{PackageRule, PackageView};
use crate::constants::{ASSEMBLY_EXTENSIONS, ASSET_FOLDERS};
use crate::report::codes::{NU5100, NU5101};
use crate::report::{LogCode, LogMessage};

fn is_assembly(path: &str) -> bool {
    let lowered = path.to_ascii_lowercase();
    ASSEMBLY_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

/// Flags assemblies that no asset folder convention picks up.
///
/// Only files whose top-level folder is one of the asset folders (`lib`,
/// `ref`, `runtimes`, `analyzers`, `build` and friends, `native`) are consumed;
/// anything else, `tools/` included, is invisible to consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyOutsideLibRule;

impl PackageRule for AssemblyOutsideLibRule {
    fn code(&self) -> LogCode {
        NU5100
    }

    fn name(&self) -> &'static str {
        "assembly-outside-lib"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        package
            .files
            .iter()
            .filter(|path| is_assembly(path))
            .filter(|path| {
                let top = path.split('/').next().unwrap_or_default();
                !path.contains('/')
                    || !ASSET_FOLDERS.iter().any(|folder| folder.eq_ignore_ascii_case(top))
            })
            .map(|path| {
                LogMessage::warning(
                    NU5100,
                    format!(
                        "The assembly '{path}' is not inside the 'lib' folder and hence it won't be \
                         added as a reference when the package is installed into a project. Move it \
                         into the 'lib' folder if it needs to be referenced."
                    ),
                )
            })
            .collect()
    }
}

/// Flags assemblies placed in `lib/` itself instead of a framework folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssemblyDirectlyUnderLibRule;

impl PackageRule for AssemblyDirectlyUnderLibRule {
    fn code(&self) -> LogCode {
        NU5101
    }

    fn name(&self) -> &'static str {
        "assembly-directly-under-lib"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        package
            .files
            .iter()
            .filter(|path| is_assembly(path))
            .filter(|path| {
                let mut parts = path.split('/');
                matches!(
                    (parts.next(), parts.next(), parts.next()),
                    (Some(top), Some(_), None) if top.eq_ignore_ascii_case("lib")
                )
            })
            .map(|path| {
                LogMessage::warning(
                    NU5101,
                    format!(
                        "The assembly '{path}' is placed directly under the 'lib' folder. It is \
                         recommended that assemblies be placed inside a framework-specific folder. \
                         Move it into a framework-specific folder."
                    ),
                )
            })
            .collect()
    }
}

//! File layout rules.

use super::{PackageRule, PackageView};
use crate::constants::PLACEHOLDER_FILE_NAME;
use crate::content::patterns;
use crate::report::codes::{NU5109, NU5110, NU5111, NU5129};
use crate::report::{LogCode, LogMessage};
use std::collections::BTreeSet;

const SCRIPT_EXTENSION: &str = ".ps1";
const KNOWN_SCRIPTS: &[&str] = &["install.ps1", "uninstall.ps1", "init.ps1"];
const MSBUILD_EXTENSIONS: &[&str] = &[".props", ".targets"];

/// Splits `path` into its folder (empty at the root) and file name.
fn split_parent(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

/// `path` without `prefix`, comparing ASCII case-insensitively.
fn strip_prefix_ignore_case<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let head = path.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &path[prefix.len()..])
}

fn is_script(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(SCRIPT_EXTENSION)
}

fn in_tools(path: &str) -> bool {
    path.split('/')
        .next()
        .is_some_and(|top| top.eq_ignore_ascii_case("tools"))
        && path.contains('/')
}

/// Flags a `_._` placeholder that shares its folder with other entries.
///
/// The placeholder marks an intentionally empty folder; next to real content
/// it is meaningless.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderFileRule;

impl PackageRule for PlaceholderFileRule {
    fn code(&self) -> LogCode {
        NU5109
    }

    fn name(&self) -> &'static str {
        "placeholder-file"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        package
            .files
            .iter()
            .filter(|path| split_parent(path).1 == PLACEHOLDER_FILE_NAME)
            .filter(|path| {
                let (folder, _) = split_parent(path);
                let prefix = if folder.is_empty() {
                    String::new()
                } else {
                    format!("{folder}/")
                };
                let entries: BTreeSet<&str> = package
                    .files
                    .iter()
                    .filter_map(|other| strip_prefix_ignore_case(other, &prefix))
                    .map(|rest| rest.split('/').next().unwrap_or(rest))
                    .collect();
                entries.len() > 1
            })
            .map(|path| {
                LogMessage::warning(
                    NU5109,
                    format!(
                        "The file at '{path}' uses the symbol for empty directory \
                         '{PLACEHOLDER_FILE_NAME}', but it is present in a directory that contains \
                         other files. Remove this file from directories that contain other files."
                    ),
                )
            })
            .collect()
    }
}

/// Flags PowerShell scripts outside `tools/`, which are never run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptOutsideToolsRule;

impl PackageRule for ScriptOutsideToolsRule {
    fn code(&self) -> LogCode {
        NU5110
    }

    fn name(&self) -> &'static str {
        "script-outside-tools"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        package
            .files
            .iter()
            .filter(|path| is_script(path) && !in_tools(path))
            .map(|path| {
                LogMessage::warning(
                    NU5110,
                    format!(
                        "The script file '{path}' is outside the 'tools' folder and hence will not \
                         be executed during installation of this package. Move it into the 'tools' \
                         folder."
                    ),
                )
            })
            .collect()
    }
}

/// Flags scripts in `tools/` whose name is not one of the known entry points.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnrecognizedScriptRule;

impl PackageRule for UnrecognizedScriptRule {
    fn code(&self) -> LogCode {
        NU5111
    }

    fn name(&self) -> &'static str {
        "unrecognized-script"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        package
            .files
            .iter()
            .filter(|path| is_script(path) && in_tools(path))
            .filter(|path| {
                let (_, file) = split_parent(path);
                !KNOWN_SCRIPTS.iter().any(|known| known.eq_ignore_ascii_case(file))
            })
            .map(|path| {
                LogMessage::warning(
                    NU5111,
                    format!(
                        "The script file '{path}' is not recognized and hence will not be executed \
                         during installation of this package. Rename it to install.ps1, \
                         uninstall.ps1 or init.ps1 and place it directly under 'tools'."
                    ),
                )
            })
            .collect()
    }
}

/// Flags `build/` folders whose MSBuild files are not named after the package.
///
/// MSBuild only imports `{id}.props` and `{id}.targets` from a package, so a
/// folder holding other `.props`/`.targets` files without the id-named one is
/// never imported.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsBuildFileNameRule;

impl PackageRule for MsBuildFileNameRule {
    fn code(&self) -> LogCode {
        NU5129
    }

    fn name(&self) -> &'static str {
        "msbuild-file-name"
    }

    fn validate(&self, package: &PackageView) -> Vec<LogMessage> {
        let id = package.id();
        if id.is_empty() {
            return Vec::new();
        }

        let found = package.content().find_items(&patterns::msbuild_files());
        let paths: Vec<String> = found.items.into_iter().map(|item| item.path).collect();
        // folder -> file names, in first-seen folder order
        let mut folders: Vec<(&str, Vec<&str>)> = Vec::new();
        for path in &paths {
            let (folder, file) = split_parent(path);
            match folders.iter_mut().find(|(f, _)| *f == folder) {
                Some((_, files)) => files.push(file),
                None => folders.push((folder, vec![file])),
            }
        }

        let mut messages = Vec::new();
        for (folder, files) in &folders {
            for extension in MSBUILD_EXTENSIONS {
                let with_extension: Vec<&&str> = files
                    .iter()
                    .filter(|file| file.to_ascii_lowercase().ends_with(extension))
                    .collect();
                if with_extension.is_empty() {
                    continue;
                }
                let expected = format!("{id}{extension}");
                if !with_extension
                    .iter()
                    .any(|file| file.eq_ignore_ascii_case(&expected))
                {
                    messages.push(LogMessage::warning(
                        NU5129,
                        format!(
                            "At least one {extension} file was found in '{folder}/', but \
                             '{folder}/{expected}' was not."
                        ),
                    ));
                }
            }
        }
        messages
    }
}

//! Streaming nuspec reader built on `quick-xml` events.

use super::{
    FrameworkAssembly, ManifestDependencyGroup, ManifestDocument, ManifestError,
    ManifestReferenceGroup,
};
use crate::framework::Framework;
use crate::models::PackageDependency;
use crate::version::{NuGetVersion, VersionRange};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fmt::Display;

fn xml_error(error: impl Display) -> ManifestError {
    ManifestError::Xml {
        message: error.to_string(),
    }
}

/// Parses nuspec XML into a [`ManifestDocument`].
///
/// # Errors
///
/// See [`ManifestDocument::parse`].
pub fn parse(xml: &str) -> Result<ManifestDocument, ManifestError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder = DocumentBuilder::default();
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => builder.open(&element)?,
            Ok(Event::Empty(element)) => {
                builder.open(&element)?;
                builder.close();
            }
            Ok(Event::End(_)) => builder.close(),
            Ok(Event::Text(text)) => {
                let value = text.unescape().map_err(xml_error)?;
                builder.text(&value);
            }
            Ok(Event::CData(data)) => {
                let bytes = data.into_inner();
                builder.text(&String::from_utf8_lossy(&bytes));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => return Err(xml_error(error)),
        }
    }
    builder.finish()
}

#[derive(Default)]
struct DocumentBuilder {
    stack: Vec<String>,
    document: ManifestDocument,
    raw_version: Option<String>,
    saw_package: bool,
    flat_dependencies: Option<usize>,
    flat_references: Option<usize>,
}

impl DocumentBuilder {
    fn ancestor(&self, depth: usize) -> Option<&str> {
        self.stack
            .len()
            .checked_sub(depth + 1)
            .map(|index| self.stack[index].as_str())
    }

    fn open(&mut self, element: &BytesStart<'_>) -> Result<(), ManifestError> {
        let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
        let attributes = read_attributes(element)?;
        let attribute = |key: &str| {
            attributes
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().to_string())
        };

        let parent = self.ancestor(0).map(str::to_string);
        let grandparent = self.ancestor(1).map(str::to_string);
        match (parent.as_deref(), grandparent.as_deref(), name.as_str()) {
            (None, _, "package") => self.saw_package = true,
            (Some("dependencies"), _, "group") => {
                self.document.dependency_groups.push(ManifestDependencyGroup {
                    target_framework: group_framework(attribute("targetFramework")),
                    dependencies: Vec::new(),
                });
            }
            (Some("dependencies"), _, "dependency") => {
                let dependency = parse_dependency(attribute("id"), attribute("version"))?;
                let index = *self.flat_dependencies.get_or_insert_with(|| {
                    self.document.dependency_groups.push(ManifestDependencyGroup {
                        target_framework: None,
                        dependencies: Vec::new(),
                    });
                    self.document.dependency_groups.len() - 1
                });
                self.document.dependency_groups[index].dependencies.push(dependency);
            }
            (Some("group"), Some("dependencies"), "dependency") => {
                let dependency = parse_dependency(attribute("id"), attribute("version"))?;
                if let Some(group) = self.document.dependency_groups.last_mut() {
                    group.dependencies.push(dependency);
                }
            }
            (Some("references"), _, "group") => {
                self.document.reference_groups.push(ManifestReferenceGroup {
                    target_framework: group_framework(attribute("targetFramework")),
                    references: Vec::new(),
                });
            }
            (Some("references"), _, "reference") => {
                if let Some(file) = attribute("file") {
                    let index = *self.flat_references.get_or_insert_with(|| {
                        self.document.reference_groups.push(ManifestReferenceGroup {
                            target_framework: None,
                            references: Vec::new(),
                        });
                        self.document.reference_groups.len() - 1
                    });
                    self.document.reference_groups[index].references.push(file);
                }
            }
            (Some("group"), Some("references"), "reference") => {
                if let (Some(file), Some(group)) =
                    (attribute("file"), self.document.reference_groups.last_mut())
                {
                    group.references.push(file);
                }
            }
            (Some("frameworkAssemblies"), _, "frameworkAssembly") => {
                if let Some(assembly_name) = attribute("assemblyName") {
                    let target_frameworks = attribute("targetFramework")
                        .map(|value| {
                            value
                                .split(',')
                                .map(str::trim)
                                .filter(|s| !s.is_empty())
                                .map(Framework::parse_lenient)
                                .collect()
                        })
                        .unwrap_or_default();
                    self.document.framework_assemblies.push(FrameworkAssembly {
                        assembly_name,
                        target_frameworks,
                    });
                }
            }
            _ => {}
        }

        self.stack.push(name);
        Ok(())
    }

    fn close(&mut self) {
        self.stack.pop();
    }

    fn text(&mut self, value: &str) {
        if self.ancestor(1) != Some("metadata") {
            return;
        }
        let value = value.trim().to_string();
        let metadata = &mut self.document.metadata;
        match self.stack.last().map(String::as_str) {
            Some("id") => metadata.id = value,
            Some("version") => self.raw_version = Some(value),
            Some("title") => metadata.title = Some(value),
            Some("authors") => metadata.authors = Some(value),
            Some("description") => metadata.description = Some(value),
            Some("summary") => metadata.summary = Some(value),
            Some("releaseNotes") => metadata.release_notes = Some(value),
            Some("tags") => metadata.tags = Some(value),
            Some("projectUrl") => metadata.project_url = Some(value),
            Some("iconUrl") => metadata.icon_url = Some(value),
            Some("licenseUrl") => metadata.license_url = Some(value),
            Some("license") => metadata.license = Some(value),
            Some("copyright") => metadata.copyright = Some(value),
            _ => {}
        }
    }

    fn finish(mut self) -> Result<ManifestDocument, ManifestError> {
        if let Some(open) = self.stack.last() {
            return Err(ManifestError::Xml {
                message: format!("element <{open}> is not closed"),
            });
        }
        if !self.saw_package {
            return Err(ManifestError::MissingRoot);
        }
        if let Some(raw) = self.raw_version.filter(|raw| !raw.is_empty()) {
            let version = NuGetVersion::parse(&raw)
                .map_err(|source| ManifestError::InvalidVersion { value: raw, source })?;
            self.document.version = Some(version);
        }
        Ok(self.document)
    }
}

fn read_attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>, ManifestError> {
    element
        .attributes()
        .map(|attribute| {
            let attribute = attribute.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(xml_error)?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn group_framework(value: Option<String>) -> Option<Framework> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| Framework::parse_lenient(&v))
}

fn parse_dependency(
    id: Option<String>,
    version: Option<String>,
) -> Result<PackageDependency, ManifestError> {
    let id = id.filter(|id| !id.is_empty()).ok_or(ManifestError::MissingDependencyId)?;
    let range = match version.filter(|v| !v.is_empty()) {
        Some(value) => VersionRange::parse(&value).map_err(|source| ManifestError::InvalidRange {
            id: id.clone(),
            value,
            source,
        })?,
        None => VersionRange::all(),
    };
    Ok(PackageDependency::new(id, range))
}

//! Configuration documents and their five sections

use super::inheritance::InheritanceMetadata;
use super::items::{
    ApplicationItem, FileItem, PrerequisiteItem, RegistryItem, SectionItem, StageItem,
};
use crate::enums::SectionKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Document-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The five ordered item sections
///
/// Used for the base document, the shared layer, every machine-specific
/// layer, and the body of each conditional section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSections {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registry: Vec<RegistryItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applications: Vec<ApplicationItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<PrerequisiteItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<StageItem>,
}

impl ConfigurationSections {
    /// Total number of items across all sections
    pub fn item_count(&self) -> usize {
        self.files.len()
            + self.registry.len()
            + self.applications.len()
            + self.prerequisites.len()
            + self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Number of items in one section (0 for unrecognized names)
    pub fn section_len(&self, kind: &SectionKind) -> usize {
        match kind {
            SectionKind::Files => self.files.len(),
            SectionKind::Registry => self.registry.len(),
            SectionKind::Applications => self.applications.len(),
            SectionKind::Prerequisites => self.prerequisites.len(),
            SectionKind::Stages => self.stages.len(),
            SectionKind::Unrecognized(_) => 0,
        }
    }

    /// Inheritance metadata of every item in one section
    pub fn metadata(&self, kind: &SectionKind) -> Vec<&InheritanceMetadata> {
        match kind {
            SectionKind::Files => collect_metadata(&self.files),
            SectionKind::Registry => collect_metadata(&self.registry),
            SectionKind::Applications => collect_metadata(&self.applications),
            SectionKind::Prerequisites => collect_metadata(&self.prerequisites),
            SectionKind::Stages => collect_metadata(&self.stages),
            SectionKind::Unrecognized(_) => Vec::new(),
        }
    }

    /// Whether any item in `kind` carries at least one of `tags`
    pub fn any_tagged(&self, kind: &SectionKind, tags: &BTreeSet<String>) -> bool {
        self.metadata(kind).iter().any(|meta| meta.has_any_tag(tags))
    }

    /// Apply `f` to the metadata of every item in every section
    pub fn for_each_metadata_mut(&mut self, mut f: impl FnMut(&mut InheritanceMetadata)) {
        self.files.iter_mut().for_each(|i| f(i.inheritance_mut()));
        self.registry.iter_mut().for_each(|i| f(i.inheritance_mut()));
        self.applications.iter_mut().for_each(|i| f(i.inheritance_mut()));
        self.prerequisites.iter_mut().for_each(|i| f(i.inheritance_mut()));
        self.stages.iter_mut().for_each(|i| f(i.inheritance_mut()));
    }

    /// Keep only items whose metadata satisfies `keep`
    pub fn retain_by_metadata(&mut self, mut keep: impl FnMut(&InheritanceMetadata) -> bool) {
        self.files.retain(|i| keep(i.inheritance()));
        self.registry.retain(|i| keep(i.inheritance()));
        self.applications.retain(|i| keep(i.inheritance()));
        self.prerequisites.retain(|i| keep(i.inheritance()));
        self.stages.retain(|i| keep(i.inheritance()));
    }

    /// Append every item of `other` after the existing items
    pub fn append(&mut self, other: ConfigurationSections) {
        self.files.extend(other.files);
        self.registry.extend(other.registry);
        self.applications.extend(other.applications);
        self.prerequisites.extend(other.prerequisites);
        self.stages.extend(other.stages);
    }
}

fn collect_metadata<T: SectionItem>(items: &[T]) -> Vec<&InheritanceMetadata> {
    items.iter().map(T::inheritance).collect()
}

/// A single (resolved or partial) configuration document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDocument {
    #[serde(default)]
    pub metadata: DocumentMetadata,

    #[serde(flatten)]
    pub sections: ConfigurationSections,
}

impl ConfigurationDocument {
    pub fn new(metadata: DocumentMetadata, sections: ConfigurationSections) -> Self {
        Self { metadata, sections }
    }

    pub fn item_count(&self) -> usize {
        self.sections.item_count()
    }
}

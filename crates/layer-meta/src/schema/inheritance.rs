//! Inheritance metadata embedded in every configuration item

use crate::enums::{ConflictPolicy, InheritanceSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Serialized field names that belong to [`InheritanceMetadata`]
///
/// Field overlays (`merge_both`) skip these so an item keeps its own
/// provenance.
pub const INHERITANCE_FIELDS: [&str; 4] = [
    "inheritance_source",
    "inheritance_priority",
    "inheritance_tags",
    "conflict_resolution",
];

/// Fallback priority for items with neither a priority nor a known source
pub const FALLBACK_PRIORITY: i64 = 50;

/// Provenance and conflict settings shared by every item kind
///
/// Flattened into the item on (de)serialization, so documents write
/// `inheritance_tags: [...]` next to `name` and `path`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InheritanceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inheritance_source: Option<InheritanceSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inheritance_priority: Option<i64>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub inheritance_tags: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_resolution: Option<ConflictPolicy>,
}

impl InheritanceMetadata {
    /// Mark the item as coming from `source`
    ///
    /// The source is always overwritten; the priority is only filled in when
    /// the item does not carry one already.
    pub fn stamp(&mut self, source: InheritanceSource, default_priority: i64) {
        self.inheritance_priority.get_or_insert(default_priority);
        self.inheritance_source = Some(source);
    }

    /// Priority used for comparisons
    ///
    /// Explicit priority, else the source default, else [`FALLBACK_PRIORITY`].
    pub fn effective_priority(&self) -> i64 {
        self.inheritance_priority
            .or_else(|| {
                self.inheritance_source
                    .as_ref()
                    .and_then(InheritanceSource::default_priority)
            })
            .unwrap_or(FALLBACK_PRIORITY)
    }

    pub fn is_from(&self, source: &InheritanceSource) -> bool {
        self.inheritance_source.as_ref() == Some(source)
    }

    pub fn shares_tag_with(&self, other: &InheritanceMetadata) -> bool {
        self.has_any_tag(&other.inheritance_tags)
    }

    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        !self.inheritance_tags.is_disjoint(tags)
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.inheritance_tags.insert(tag.into());
    }
}

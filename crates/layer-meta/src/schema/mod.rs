//! Layered document schema
//!
//! Types in this module are what a parsed document deserializes into and
//! what the resolver hands to backup/restore executors.

mod conditional;
mod document;
mod inheritance;
mod items;
mod layered;
mod rule;
mod selector;

pub use conditional::{Condition, ConditionalSection};
pub use document::{ConfigurationDocument, ConfigurationSections, DocumentMetadata};
pub use inheritance::{FALLBACK_PRIORITY, INHERITANCE_FIELDS, InheritanceMetadata};
pub use items::{
    ApplicationItem, ConfigurationItem, FileItem, PrerequisiteItem, RegistryItem, SectionItem,
    StageItem,
};
pub use layered::{DEFAULT_LAYER_PRIORITY, LayeredDocument, MachineSpecificLayer};
pub use rule::{InheritanceRule, RuleCondition, RuleParameters};
pub use selector::MachineSelector;

//! Data model for layered backup/restore configuration
//!
//! A layered document describes files, registry keys, applications,
//! prerequisites, and lifecycle stages to capture or restore, split across:
//!
//! - **Base** items that apply everywhere
//! - A **shared** layer of common items
//! - **Machine-specific** layers gated by selectors
//! - **Inheritance rules** that reshape items after merging
//! - **Conditional sections** injected when environment predicates hold
//!
//! This crate only defines the types. `layer-core` resolves a
//! [`LayeredDocument`] into a single [`ConfigurationDocument`] for one
//! [`MachineContext`].
//!
//! # Crate layout
//!
//! - [`schema`]: documents, sections, items, selectors, rules
//! - [`enums`]: textual enumerations that tolerate unknown values
//! - [`context`]: immutable machine snapshot
//! - [`fields`]: field-level access to typed items

pub mod context;
pub mod enums;
pub mod error;
pub mod fields;
pub mod schema;

pub use context::{MachineContext, MachineContextBuilder};
pub use enums::{
    ConditionLogic, ConditionType, ConflictPolicy, FallbackStrategy, InheritanceSource,
    MergeStrategy, Operator, RuleAction, SectionKind, SelectorType, ValidationLevel,
};
pub use error::{Error, Result};
pub use schema::{
    ApplicationItem, Condition, ConditionalSection, ConfigurationDocument, ConfigurationItem,
    ConfigurationSections, DocumentMetadata, FileItem, InheritanceMetadata, InheritanceRule,
    LayeredDocument, MachineSelector, MachineSpecificLayer, PrerequisiteItem, RegistryItem,
    RuleCondition, RuleParameters, SectionItem, StageItem,
};

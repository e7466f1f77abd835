//! Resolution pipeline for layered backup configuration
//!
//! Turns a [`LayeredDocument`](layer_meta::LayeredDocument) into one
//! conflict-free [`ConfigurationDocument`](layer_meta::ConfigurationDocument)
//! for a specific machine:
//!
//! - **Selector evaluation**: machine name, hostname patterns, environment
//!   variables, external values, and registered scripts
//! - **Layer merging**: shared layer, then machine-specific layers by priority,
//!   with replace, shallow, or deep merge and per-item conflict policies
//! - **Inheritance rules**: merge, replace, transform, and validate actions
//! - **Conditional sections**: AND/OR/NOT over heterogeneous predicates
//! - **Validation**: strict, moderate, or relaxed
//!
//! # Architecture
//!
//! ```text
//!                      Resolver
//!                         |
//!     +---------+---------+---------+------------+
//!     |         |         |         |            |
//!   merge     rules   conditional  validation   context
//!     \         |         /
//!      +---- selector ---+
//!                |
//!             scripts
//! ```
//!
//! # Example
//!
//! ```
//! use layer_core::{InheritanceSettings, Resolver};
//! use layer_meta::{LayeredDocument, MachineContext};
//!
//! let layered: LayeredDocument = serde_json::from_value(serde_json::json!({
//!     "metadata": { "name": "workstation" },
//!     "files": [{ "name": "hosts", "path": "/etc/hosts" }]
//! }))
//! .unwrap();
//!
//! let context = MachineContext::builder("DEV-01").build();
//! let resolution = Resolver::new(InheritanceSettings::default())
//!     .resolve(&layered, &context)
//!     .unwrap();
//! assert_eq!(resolution.document.item_count(), 1);
//! ```
//!
//! # Logging
//!
//! Everything logs through `tracing`. Hosts without a subscriber of their own
//! can call [`logging::init`] with the run's settings; `RUST_LOG` overrides
//! the settings' `log_filter`.

pub mod conditional;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod merge;
pub mod resolver;
pub mod rules;
pub mod scripts;
pub mod selector;
pub mod validation;

pub use conditional::ConditionalApplier;
pub use config::InheritanceSettings;
pub use context::MachineContextProvider;
pub use error::{Error, Result};
pub use merge::{ConfigurationMerger, ConflictResolver};
pub use resolver::{Resolution, ResolutionContext, ResolutionReport, ResolutionStage, Resolver};
pub use rules::RuleEngine;
pub use scripts::{
    ExternalValueSource, PredicateScript, ScriptFailure, ScriptRegistry, StaticValueSource,
    TransformScript, ValidatorScript,
};
pub use selector::SelectorEvaluator;
pub use validation::{ConfigurationValidator, IssueKind, ValidationIssue, ValidationReport};

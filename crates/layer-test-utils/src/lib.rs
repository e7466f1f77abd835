//! Shared test utilities for the layered configuration workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`context`]: deterministic [`MachineContext`](layer_meta::MachineContext) values
//! - [`items`]: terse constructors for every item kind
//! - [`document`]: [`LayeredBuilder`](document::LayeredBuilder) and YAML fixtures

pub mod context;
pub mod document;
pub mod items;

pub use context::machine;
pub use document::{LayeredBuilder, fixture};

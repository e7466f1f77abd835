//! Layer merging and per-item conflict resolution
//!
//! Three strategies are supported when a machine-specific layer is merged:
//!
//! - `replace`: populated sections are replaced wholesale
//! - `shallow_merge`: items are appended as-is
//! - `deep_merge`: items are paired by name (else by first shared tag) and
//!   each pair is settled by [`ConflictResolver`]

mod conflict;
mod merger;

pub use conflict::ConflictResolver;
pub use merger::{ConfigurationMerger, find_pair};

//! Global inheritance settings
//!
//! Settings control how layers are folded together and how strictly the
//! result is validated. They are supplied by the caller, either as an already
//! parsed value or as TOML:
//!
//! ```toml
//! inheritance_mode = "merge"
//! machine_precedence = true
//! validation_level = "moderate"
//! fallback_strategy = "use_shared"
//!
//! # Keys in a nested `configuration` table win over top-level keys
//! [configuration]
//! validation_level = "strict"
//! ```

mod settings;

pub use settings::InheritanceSettings;

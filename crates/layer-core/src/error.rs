//! Error types for layer-core

use crate::resolver::ResolutionStage;
use layer_meta::ValidationLevel;

/// Result type for layer-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a resolution run
///
/// Selector, predicate, and script failures never show up here: they are
/// logged and count as a non-match. Rule problems are logged and the rule is
/// skipped. What remains are merge failures, validation failures, and bad
/// settings.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An item could not be merged
    #[error("Merge failed for item '{item}' from {layer}: {reason}")]
    Merge {
        layer: String,
        item: String,
        reason: String,
    },

    /// A conflict-resolution policy value that cannot be interpreted
    #[error("Malformed conflict resolution policy '{value}' on item '{item}'")]
    MalformedPolicy { item: String, value: String },

    /// The resolved document failed validation
    #[error("Validation failed ({level}): {}", .issues.join("; "))]
    Validation {
        level: ValidationLevel,
        issues: Vec<String>,
    },

    /// The resolved document has no items at all
    #[error("Resolved configuration is empty")]
    EmptyConfiguration,

    /// An inheritance setting has an unusable value
    #[error("Invalid setting '{key}': {message}")]
    InvalidSetting { key: String, message: String },

    /// The log subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    /// A resolution run failed after reaching `stage`
    #[error("Resolution failed after stage {stage}: {source}")]
    Resolution {
        stage: ResolutionStage,
        #[source]
        source: Box<Error>,
    },

    /// Model error from layer-meta
    #[error(transparent)]
    Meta(#[from] layer_meta::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl Error {
    /// The last stage a failed resolution reached, if this is one
    pub fn stage(&self) -> Option<ResolutionStage> {
        match self {
            Self::Resolution { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

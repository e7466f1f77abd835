//! Error types for layer-meta

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to convert {kind} item '{item}': {source}")]
    Conversion {
        kind: String,
        item: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot set field '{field}' on {kind} item '{item}': {message}")]
    InvalidField {
        kind: String,
        item: String,
        field: String,
        message: String,
    },

    #[error("{kind} item '{item}' does not serialize to an object")]
    NotAnObject { kind: String, item: String },
}

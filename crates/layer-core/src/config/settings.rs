//! Parsing and defaults for [`InheritanceSettings`]

use crate::{Error, Result};
use layer_meta::{FallbackStrategy, MergeStrategy, ValidationLevel};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Key of the nested table whose entries override top-level settings
const NESTED_KEY: &str = "configuration";

/// Options that shape a resolution run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InheritanceSettings {
    /// Strategy for machine layers that do not set their own
    pub inheritance_mode: MergeStrategy,

    /// Prefer machine-specific items when no policy is set on either side
    pub machine_precedence: bool,

    pub validation_level: ValidationLevel,

    /// What to keep when no machine-specific layer applies
    pub fallback_strategy: FallbackStrategy,

    /// Log directives used when `RUST_LOG` is not set
    pub log_filter: Option<String>,
}

impl Default for InheritanceSettings {
    fn default() -> Self {
        Self {
            inheritance_mode: MergeStrategy::DeepMerge,
            machine_precedence: true,
            validation_level: ValidationLevel::Moderate,
            fallback_strategy: FallbackStrategy::UseShared,
            log_filter: None,
        }
    }
}

impl InheritanceSettings {
    /// Build settings from a parsed table
    ///
    /// Unrecognized keys are ignored. Recognized keys inside a nested
    /// `configuration` table are applied after, and therefore override, the
    /// top-level ones.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| Error::InvalidSetting {
            key: "<root>".to_string(),
            message: "expected a table of settings".to_string(),
        })?;

        let mut settings = Self::default();
        settings.apply(map)?;

        if let Some(nested) = map.get(NESTED_KEY) {
            let nested = nested.as_object().ok_or_else(|| Error::InvalidSetting {
                key: NESTED_KEY.to_string(),
                message: "expected a table".to_string(),
            })?;
            settings.apply(nested)?;
        }

        Ok(settings)
    }

    /// Parse settings from TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = toml::from_str(content)?;
        Self::from_value(&value)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(?path, "Loading inheritance settings");
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn apply(&mut self, map: &Map<String, Value>) -> Result<()> {
        for (key, value) in map {
            match key.as_str() {
                "inheritance_mode" => {
                    let mode = MergeStrategy::from(text(key, value)?);
                    if !mode.is_recognized() {
                        return Err(unknown_value(key, &mode.to_string()));
                    }
                    self.inheritance_mode = mode;
                }
                "machine_precedence" => {
                    self.machine_precedence = boolean(key, value)?;
                }
                "validation_level" => {
                    let level = ValidationLevel::from(text(key, value)?);
                    if !level.is_recognized() {
                        return Err(unknown_value(key, &level.to_string()));
                    }
                    self.validation_level = level;
                }
                "fallback_strategy" => {
                    let fallback = FallbackStrategy::from(text(key, value)?);
                    if !fallback.is_recognized() {
                        return Err(unknown_value(key, &fallback.to_string()));
                    }
                    self.fallback_strategy = fallback;
                }
                "log_filter" => {
                    self.log_filter = Some(text(key, value)?.to_string());
                }
                NESTED_KEY => {}
                other => tracing::trace!(key = other, "Ignoring unrecognized inheritance setting"),
            }
        }
        Ok(())
    }
}

fn text<'a>(key: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| Error::InvalidSetting {
        key: key.to_string(),
        message: format!("expected a string, got {value}"),
    })
}

fn boolean(key: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(Error::InvalidSetting {
            key: key.to_string(),
            message: format!("expected a boolean, got {other}"),
        }),
    }
}

fn unknown_value(key: &str, raw: &str) -> Error {
    Error::InvalidSetting {
        key: key.to_string(),
        message: format!("unknown value '{raw}'"),
    }
}

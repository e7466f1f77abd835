//! Caller-supplied scripts and external lookups
//!
//! Documents refer to scripts by name (`script: has-gpu`). The caller
//! registers an implementation for each name before resolving; the resolver
//! only invokes them and never looks inside. Closures with the right
//! signature implement the traits directly:
//!
//! ```
//! use layer_core::scripts::ScriptRegistry;
//! use serde_json::json;
//!
//! let scripts = ScriptRegistry::new()
//!     .with_predicate("is-laptop", |ctx| {
//!         Ok(json!(ctx.fact("chassis") == Some("laptop")))
//!     });
//! assert!(scripts.predicate("is-laptop").is_some());
//! ```
//!
//! Script failures are reported as [`ScriptFailure`] and treated by the
//! resolver as a non-match; they never abort a run.

use layer_meta::{ConfigurationItem, MachineContext};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Error raised by a caller-supplied script
pub type ScriptFailure = Box<dyn std::error::Error + Send + Sync>;

/// Predicate over the machine context (selector `script`, `custom_script`)
pub trait PredicateScript: Send + Sync {
    fn evaluate(&self, context: &MachineContext) -> Result<Value, ScriptFailure>;
}

impl<F> PredicateScript for F
where
    F: Fn(&MachineContext) -> Result<Value, ScriptFailure> + Send + Sync,
{
    fn evaluate(&self, context: &MachineContext) -> Result<Value, ScriptFailure> {
        self(context)
    }
}

/// Item transform used by `transform` rules
pub trait TransformScript: Send + Sync {
    fn transform(
        &self,
        item: ConfigurationItem,
        context: &MachineContext,
    ) -> Result<ConfigurationItem, ScriptFailure>;
}

impl<F> TransformScript for F
where
    F: Fn(ConfigurationItem, &MachineContext) -> Result<ConfigurationItem, ScriptFailure>
        + Send
        + Sync,
{
    fn transform(
        &self,
        item: ConfigurationItem,
        context: &MachineContext,
    ) -> Result<ConfigurationItem, ScriptFailure> {
        self(item, context)
    }
}

/// Item check used by `validate` rules
pub trait ValidatorScript: Send + Sync {
    fn validate(
        &self,
        item: &ConfigurationItem,
        context: &MachineContext,
    ) -> Result<bool, ScriptFailure>;
}

impl<F> ValidatorScript for F
where
    F: Fn(&ConfigurationItem, &MachineContext) -> Result<bool, ScriptFailure> + Send + Sync,
{
    fn validate(
        &self,
        item: &ConfigurationItem,
        context: &MachineContext,
    ) -> Result<bool, ScriptFailure> {
        self(item, context)
    }
}

/// Reads values from an external store (e.g. the Windows registry)
///
/// `Ok(None)` means the location exists but holds no such value.
pub trait ExternalValueSource: Send + Sync {
    fn read(&self, path: &str, name: Option<&str>) -> Result<Option<String>, ScriptFailure>;
}

/// In-memory [`ExternalValueSource`], keyed by `(path, name)`
#[derive(Debug, Clone, Default)]
pub struct StaticValueSource {
    values: HashMap<(String, Option<String>), String>,
}

impl StaticValueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(
        mut self,
        path: impl Into<String>,
        name: Option<&str>,
        value: impl Into<String>,
    ) -> Self {
        self.values
            .insert((path.into(), name.map(str::to_string)), value.into());
        self
    }
}

impl ExternalValueSource for StaticValueSource {
    fn read(&self, path: &str, name: Option<&str>) -> Result<Option<String>, ScriptFailure> {
        let key = (path.to_string(), name.map(str::to_string));
        if let Some(value) = self.values.get(&key) {
            return Ok(Some(value.clone()));
        }
        if self.values.keys().any(|(p, _)| p == path) {
            Ok(None)
        } else {
            Err(format!("path not found: {path}").into())
        }
    }
}

/// Named scripts and the external value source for a run
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    predicates: HashMap<String, Arc<dyn PredicateScript>>,
    transforms: HashMap<String, Arc<dyn TransformScript>>,
    validators: HashMap<String, Arc<dyn ValidatorScript>>,
    external: Option<Arc<dyn ExternalValueSource>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predicate<F>(mut self, name: impl Into<String>, script: F) -> Self
    where
        F: Fn(&MachineContext) -> Result<Value, ScriptFailure> + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(script));
        self
    }

    pub fn with_transform<F>(mut self, name: impl Into<String>, script: F) -> Self
    where
        F: Fn(ConfigurationItem, &MachineContext) -> Result<ConfigurationItem, ScriptFailure>
            + Send
            + Sync
            + 'static,
    {
        self.transforms.insert(name.into(), Arc::new(script));
        self
    }

    pub fn with_validator<F>(mut self, name: impl Into<String>, script: F) -> Self
    where
        F: Fn(&ConfigurationItem, &MachineContext) -> Result<bool, ScriptFailure>
            + Send
            + Sync
            + 'static,
    {
        self.validators.insert(name.into(), Arc::new(script));
        self
    }

    pub fn with_external_source(mut self, source: impl ExternalValueSource + 'static) -> Self {
        self.external = Some(Arc::new(source));
        self
    }

    /// Register a predicate implemented by a type rather than a closure
    pub fn register_predicate(&mut self, name: impl Into<String>, script: Arc<dyn PredicateScript>) {
        self.predicates.insert(name.into(), script);
    }

    pub fn register_transform(&mut self, name: impl Into<String>, script: Arc<dyn TransformScript>) {
        self.transforms.insert(name.into(), script);
    }

    pub fn register_validator(&mut self, name: impl Into<String>, script: Arc<dyn ValidatorScript>) {
        self.validators.insert(name.into(), script);
    }

    pub fn predicate(&self, name: &str) -> Option<&dyn PredicateScript> {
        self.predicates.get(name).map(Arc::as_ref)
    }

    pub fn transform(&self, name: &str) -> Option<&dyn TransformScript> {
        self.transforms.get(name).map(Arc::as_ref)
    }

    pub fn validator(&self, name: &str) -> Option<&dyn ValidatorScript> {
        self.validators.get(name).map(Arc::as_ref)
    }

    pub fn external_source(&self) -> Option<&dyn ExternalValueSource> {
        self.external.as_deref()
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut predicates: Vec<_> = self.predicates.keys().collect();
        let mut transforms: Vec<_> = self.transforms.keys().collect();
        let mut validators: Vec<_> = self.validators.keys().collect();
        predicates.sort();
        transforms.sort();
        validators.sort();
        f.debug_struct("ScriptRegistry")
            .field("predicates", &predicates)
            .field("transforms", &transforms)
            .field("validators", &validators)
            .field("external", &self.external.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_meta::{FileItem, SectionItem};
    use serde_json::json;

    fn context() -> MachineContext {
        MachineContext::builder("host").fact("chassis", "laptop").build()
    }

    #[test]
    fn test_closures_register_as_scripts() {
        let scripts = ScriptRegistry::new()
            .with_predicate("is-laptop", |ctx: &MachineContext| {
                Ok(json!(ctx.fact("chassis") == Some("laptop")))
            })
            .with_transform("noop", |item: ConfigurationItem, _: &MachineContext| Ok(item))
            .with_validator("named", |item: &ConfigurationItem, _: &MachineContext| {
                Ok(!item.name().is_empty())
            });

        let ctx = context();
        let result = scripts.predicate("is-laptop").unwrap().evaluate(&ctx).unwrap();
        assert_eq!(result, json!(true));

        let item = FileItem {
            name: "hosts".to_string(),
            ..Default::default()
        }
        .into_item();
        assert!(scripts.validator("named").unwrap().validate(&item, &ctx).unwrap());
        let same = scripts.transform("noop").unwrap().transform(item.clone(), &ctx).unwrap();
        assert_eq!(same, item);

        assert!(scripts.predicate("missing").is_none());
        assert!(scripts.external_source().is_none());
    }

    #[test]
    fn test_static_value_source() {
        let source = StaticValueSource::new().with_value("HKLM\\Software\\Vendor", Some("Edition"), "Pro");

        assert_eq!(
            source.read("HKLM\\Software\\Vendor", Some("Edition")).unwrap(),
            Some("Pro".to_string())
        );
        assert_eq!(source.read("HKLM\\Software\\Vendor", Some("Other")).unwrap(), None);
        assert!(source.read("HKLM\\Software\\Missing", None).is_err());
    }

    #[test]
    fn test_debug_lists_names_only() {
        let scripts = ScriptRegistry::new()
            .with_predicate("b", |_: &MachineContext| Ok(json!(1)))
            .with_predicate("a", |_: &MachineContext| Ok(json!(2)));
        let debug = format!("{scripts:?}");
        assert!(debug.contains("[\"a\", \"b\"]"));
    }
}

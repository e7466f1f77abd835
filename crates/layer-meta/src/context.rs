//! Immutable snapshot of the machine a document is resolved for
//!
//! A `MachineContext` is built once per resolution run (either collected from
//! the live system by `layer-core` or assembled with [`MachineContextBuilder`])
//! and then only read. Every selector and predicate in the run evaluates
//! against the same snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of machine identity, environment, and coarse system facts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineContext {
    machine_name: String,
    user_name: String,
    environment: BTreeMap<String, String>,
    facts: BTreeMap<String, String>,
    captured_at: DateTime<Utc>,
}

impl MachineContext {
    /// Start building a context for the given machine name
    pub fn builder(machine_name: impl Into<String>) -> MachineContextBuilder {
        MachineContextBuilder::new(machine_name)
    }

    pub fn machine_name(&self) -> &str {
        &self.machine_name
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    pub fn facts(&self) -> &BTreeMap<String, String> {
        &self.facts
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Look up an environment variable
    ///
    /// An exact key match always wins. When `case_sensitive` is false the
    /// first key that matches ignoring ASCII case is used as a fallback,
    /// mirroring how Windows treats variable names.
    pub fn env_var(&self, key: &str, case_sensitive: bool) -> Option<&str> {
        if let Some(value) = self.environment.get(key) {
            return Some(value.as_str());
        }
        if case_sensitive {
            return None;
        }
        self.environment
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Look up a hardware/software fact by name
    pub fn fact(&self, name: &str) -> Option<&str> {
        self.facts.get(name).map(String::as_str)
    }
}

/// Builder for [`MachineContext`]
#[derive(Debug, Clone)]
pub struct MachineContextBuilder {
    machine_name: String,
    user_name: String,
    environment: BTreeMap<String, String>,
    facts: BTreeMap<String, String>,
    captured_at: Option<DateTime<Utc>>,
}

impl MachineContextBuilder {
    pub fn new(machine_name: impl Into<String>) -> Self {
        Self {
            machine_name: machine_name.into(),
            user_name: String::new(),
            environment: BTreeMap::new(),
            facts: BTreeMap::new(),
            captured_at: None,
        }
    }

    pub fn user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = user_name.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn fact(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.facts.insert(name.into(), value.into());
        self
    }

    pub fn facts<I, K, V>(mut self, facts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.facts
            .extend(facts.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Pin the capture timestamp (defaults to the moment `build` is called)
    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = Some(at);
        self
    }

    pub fn build(self) -> MachineContext {
        MachineContext {
            machine_name: self.machine_name,
            user_name: self.user_name,
            environment: self.environment,
            facts: self.facts,
            captured_at: self.captured_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MachineContext {
        MachineContext::builder("WORKSTATION-01")
            .user_name("alex")
            .env("Path", "C:\\Windows")
            .env("PROFILE", "dev")
            .fact("total_memory_gb", "32")
            .build()
    }

    #[test]
    fn test_builder_populates_fields() {
        let ctx = sample();
        assert_eq!(ctx.machine_name(), "WORKSTATION-01");
        assert_eq!(ctx.user_name(), "alex");
        assert_eq!(ctx.environment().len(), 2);
        assert_eq!(ctx.fact("total_memory_gb"), Some("32"));
        assert_eq!(ctx.fact("gpu"), None);
    }

    #[test]
    fn test_env_var_exact_match() {
        let ctx = sample();
        assert_eq!(ctx.env_var("PROFILE", true), Some("dev"));
        assert_eq!(ctx.env_var("Path", true), Some("C:\\Windows"));
    }

    #[test]
    fn test_env_var_case_fallback_only_when_insensitive() {
        let ctx = sample();
        assert_eq!(ctx.env_var("PATH", false), Some("C:\\Windows"));
        assert_eq!(ctx.env_var("PATH", true), None);
        assert_eq!(ctx.env_var("MISSING", false), None);
    }

    #[test]
    fn test_captured_at_can_be_pinned() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ctx = MachineContext::builder("host").captured_at(at).build();
        assert_eq!(ctx.captured_at(), at);
    }
}

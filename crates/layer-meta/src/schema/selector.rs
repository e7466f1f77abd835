//! Machine selectors gate layers and rules on the current machine

use crate::enums::{Operator, SelectorType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed predicate evaluated against the machine context
///
/// How the fields are read depends on `selector_type`:
///
/// | type                   | compared value                      | expected         |
/// |------------------------|-------------------------------------|------------------|
/// | `machine_name`         | machine name                        | `value`          |
/// | `hostname_pattern`     | machine name                        | `value` (pattern)|
/// | `environment_variable` | variable named by `value`           | `expected_value` |
/// | `external_value`       | lookup of `path` / `value`          | `expected_value` |
/// | `script`               | result of the registered `script`   | `expected_result`|
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSelector {
    #[serde(rename = "type")]
    pub selector_type: SelectorType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,

    /// Location read by `external_value` selectors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Registered predicate name for `script` selectors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<Value>,

    #[serde(default)]
    pub case_sensitive: bool,
}

impl MachineSelector {
    fn with_type(selector_type: SelectorType) -> Self {
        Self {
            selector_type,
            operator: None,
            value: None,
            expected_value: None,
            path: None,
            script: None,
            expected_result: None,
            case_sensitive: false,
        }
    }

    pub fn machine_name(name: impl Into<String>) -> Self {
        Self {
            value: Some(name.into()),
            ..Self::with_type(SelectorType::MachineName)
        }
    }

    pub fn hostname_pattern(pattern: impl Into<String>) -> Self {
        Self {
            value: Some(pattern.into()),
            ..Self::with_type(SelectorType::HostnamePattern)
        }
    }

    pub fn environment_variable(name: impl Into<String>, expected: Option<&str>) -> Self {
        Self {
            value: Some(name.into()),
            expected_value: expected.map(str::to_string),
            ..Self::with_type(SelectorType::EnvironmentVariable)
        }
    }

    pub fn external_value(
        path: impl Into<String>,
        name: impl Into<String>,
        expected: Option<&str>,
    ) -> Self {
        Self {
            path: Some(path.into()),
            value: Some(name.into()),
            expected_value: expected.map(str::to_string),
            ..Self::with_type(SelectorType::ExternalValue)
        }
    }

    pub fn script(name: impl Into<String>, expected_result: Value) -> Self {
        Self {
            script: Some(name.into()),
            expected_result: Some(expected_result),
            ..Self::with_type(SelectorType::Script)
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

//! Conditional sections injected when their predicates hold

use super::document::ConfigurationSections;
use super::selector::MachineSelector;
use crate::enums::{ConditionLogic, ConditionType, Operator};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named block of items gated by a compound condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalSection {
    pub name: String,

    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(default)]
    pub logic: ConditionLogic,

    #[serde(flatten)]
    pub sections: ConfigurationSections,
}

/// One predicate in a conditional section
///
/// - `custom_script`: `script` + `expected_result`
/// - `hardware_check`: fact named by `check`, compared to `value`
/// - `environment_variable`: variable named by `check`, compared to `value`
/// - `machine_selector`: the embedded `selector`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<MachineSelector>,

    #[serde(default)]
    pub case_sensitive: bool,
}

impl Condition {
    fn with_type(condition_type: ConditionType) -> Self {
        Self {
            condition_type,
            script: None,
            expected_result: None,
            check: None,
            operator: None,
            value: None,
            selector: None,
            case_sensitive: false,
        }
    }

    pub fn custom_script(script: impl Into<String>, expected_result: Value) -> Self {
        Self {
            script: Some(script.into()),
            expected_result: Some(expected_result),
            ..Self::with_type(ConditionType::CustomScript)
        }
    }

    pub fn hardware_check(fact: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            check: Some(fact.into()),
            operator: Some(operator),
            value: Some(value.into()),
            ..Self::with_type(ConditionType::HardwareCheck)
        }
    }

    pub fn environment_variable(name: impl Into<String>, expected: Option<&str>) -> Self {
        Self {
            check: Some(name.into()),
            value: expected.map(str::to_string),
            ..Self::with_type(ConditionType::EnvironmentVariable)
        }
    }

    pub fn machine_selector(selector: MachineSelector) -> Self {
        Self {
            selector: Some(selector),
            ..Self::with_type(ConditionType::MachineSelector)
        }
    }
}

//! Custom inheritance rules applied after layer merging
//!
//! # Example YAML
//!
//! ```yaml
//! inheritance_rules:
//!   - name: encrypt-secrets
//!     applies_to: [files, registry]
//!     condition:
//!       inheritance_tags: [secret]
//!     action: replace
//!     parameters:
//!       replacement_values:
//!         encrypt: true
//! ```

use super::selector::MachineSelector;
use crate::enums::{RuleAction, SectionKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One rule, applied in document order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InheritanceRule {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RuleCondition>,

    /// Sections the rule touches; empty means all of them
    #[serde(default)]
    pub applies_to: Vec<SectionKind>,

    pub action: RuleAction,

    #[serde(default)]
    pub parameters: RuleParameters,

    /// Rule-level transform script; replaces each section with its outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl InheritanceRule {
    pub fn new(name: impl Into<String>, action: RuleAction) -> Self {
        Self {
            name: name.into(),
            condition: None,
            applies_to: Vec::new(),
            action,
            parameters: RuleParameters::default(),
            script: None,
        }
    }

    /// Sections this rule targets, expanding an empty list to all five
    pub fn target_sections(&self) -> Vec<SectionKind> {
        if self.applies_to.is_empty() {
            SectionKind::ALL.to_vec()
        } else {
            self.applies_to.clone()
        }
    }

    /// Tags an item must share to receive the action (empty means every item)
    pub fn match_tags(&self) -> Option<&BTreeSet<String>> {
        self.condition
            .as_ref()
            .map(|c| &c.inheritance_tags)
            .filter(|tags| !tags.is_empty())
    }
}

/// Gate deciding whether a rule runs at all
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub inheritance_tags: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_selectors: Vec<MachineSelector>,
}

/// Action-specific parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleParameters {
    /// Granularity for `merge`; only "value" is supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_level: Option<String>,

    /// Field overwrites for `replace`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub replacement_values: BTreeMap<String, Value>,

    /// Registered transform for `transform`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_script: Option<String>,

    /// Properties an item must carry to survive `validate`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_properties: Vec<String>,

    /// Registered validator for `validate`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_script: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_applies_to_targets_every_section() {
        let rule = InheritanceRule::new("all", RuleAction::Validate);
        assert_eq!(rule.target_sections().len(), 5);
    }

    #[test]
    fn test_parse_rule_with_parameters() {
        let rule: InheritanceRule = serde_json::from_value(serde_json::json!({
            "name": "encrypt-secrets",
            "applies_to": ["files", "registry"],
            "condition": { "inheritance_tags": ["secret"] },
            "action": "replace",
            "parameters": { "replacement_values": { "encrypt": true } }
        }))
        .unwrap();

        assert_eq!(rule.action, RuleAction::Replace);
        assert_eq!(rule.applies_to, vec![SectionKind::Files, SectionKind::Registry]);
        assert_eq!(rule.parameters.replacement_values["encrypt"], true);
        assert!(rule.match_tags().unwrap().contains("secret"));
    }

    #[test]
    fn test_match_tags_ignores_empty_tag_condition() {
        let mut rule = InheritanceRule::new("r", RuleAction::Merge);
        rule.condition = Some(RuleCondition::default());
        assert!(rule.match_tags().is_none());
    }

    #[test]
    fn test_unknown_action_is_kept() {
        let rule: InheritanceRule = serde_json::from_value(serde_json::json!({
            "name": "odd",
            "action": "explode"
        }))
        .unwrap();
        assert!(!rule.action.is_recognized());
    }
}

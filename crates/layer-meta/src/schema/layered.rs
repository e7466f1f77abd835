//! The layered input document
//!
//! # Example YAML
//!
//! ```yaml
//! metadata:
//!   name: developer-workstation
//!   version: "1.2"
//! files:
//!   - name: Git config
//!     path: ~/.gitconfig
//! shared:
//!   applications:
//!     - name: Firefox
//!       package_id: Mozilla.Firefox
//! machine_specific:
//!   - name: build-servers
//!     priority: 90
//!     machine_selectors:
//!       - type: hostname_pattern
//!         value: "BUILD-*"
//!     files:
//!       - name: Git config
//!         path: ~/.gitconfig
//!         action: restore
//! inheritance_rules: []
//! conditional_sections: []
//! ```

use super::conditional::ConditionalSection;
use super::document::{ConfigurationSections, DocumentMetadata};
use super::rule::InheritanceRule;
use super::selector::MachineSelector;
use crate::enums::MergeStrategy;
use serde::{Deserialize, Serialize};

/// Default priority of a machine-specific layer
pub const DEFAULT_LAYER_PRIORITY: i64 = 80;

/// A layer that only applies on machines matching its selectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSpecificLayer {
    pub name: String,

    /// OR-combined; a layer without selectors never applies
    #[serde(default)]
    pub machine_selectors: Vec<MachineSelector>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,

    /// Overrides the global inheritance mode for this layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<MergeStrategy>,

    #[serde(flatten)]
    pub sections: ConfigurationSections,
}

impl MachineSpecificLayer {
    pub fn effective_priority(&self) -> i64 {
        self.priority.unwrap_or(DEFAULT_LAYER_PRIORITY)
    }
}

/// Everything needed to resolve a configuration for one machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayeredDocument {
    #[serde(default)]
    pub metadata: DocumentMetadata,

    /// Base layer
    #[serde(flatten)]
    pub base: ConfigurationSections,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<ConfigurationSections>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_specific: Vec<MachineSpecificLayer>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inheritance_rules: Vec<InheritanceRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_sections: Vec<ConditionalSection>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::SelectorType;

    #[test]
    fn test_parse_layered_document() {
        let yaml = r#"
metadata:
  name: developer-workstation
files:
  - name: Git config
    path: ~/.gitconfig
shared:
  applications:
    - name: Firefox
      package_id: Mozilla.Firefox
machine_specific:
  - name: build-servers
    priority: 90
    merge_strategy: replace
    machine_selectors:
      - type: hostname_pattern
        value: "BUILD-*"
    files:
      - name: Git config
        path: ~/.gitconfig
        action: restore
"#;
        let doc: LayeredDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.metadata.name.as_deref(), Some("developer-workstation"));
        assert_eq!(doc.base.files.len(), 1);
        assert_eq!(doc.shared.as_ref().unwrap().applications.len(), 1);

        let layer = &doc.machine_specific[0];
        assert_eq!(layer.effective_priority(), 90);
        assert_eq!(layer.merge_strategy, Some(MergeStrategy::Replace));
        assert_eq!(
            layer.machine_selectors[0].selector_type,
            SelectorType::HostnamePattern
        );
        assert_eq!(layer.sections.files[0].action.as_deref(), Some("restore"));
    }

    #[test]
    fn test_layer_priority_default() {
        let layer: MachineSpecificLayer =
            serde_json::from_value(serde_json::json!({ "name": "any" })).unwrap();
        assert_eq!(layer.effective_priority(), DEFAULT_LAYER_PRIORITY);
        assert!(layer.machine_selectors.is_empty());
    }
}

//! Layered document builders and on-disk fixtures

use layer_meta::{
    ConditionalSection, ConfigurationSections, DocumentMetadata, InheritanceRule, LayeredDocument,
    MachineSelector, MachineSpecificLayer, MergeStrategy,
};
use std::path::PathBuf;

/// Directory holding the YAML fixtures
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/layered")
}

/// Load `test-fixtures/layered/<name>.yaml`
///
/// # Panics
/// Panics if the file is missing or does not parse; fixtures are part of the
/// test suite.
pub fn fixture(name: &str) -> LayeredDocument {
    let path = fixtures_dir().join(format!("{name}.yaml"));
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()));
    serde_yaml::from_str(&content).unwrap_or_else(|e| panic!("fixture {}: {e}", path.display()))
}

/// Fluent builder for [`LayeredDocument`]
///
/// ```rust
/// use layer_test_utils::LayeredBuilder;
/// use layer_test_utils::items::file;
///
/// let doc = LayeredBuilder::new("workstation")
///     .base(|s| s.files.push(file("hosts", "/etc/hosts")))
///     .shared(|s| s.files.push(file("gitconfig", "~/.gitconfig")))
///     .build();
/// assert_eq!(doc.base.files.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayeredBuilder {
    document: LayeredDocument,
}

impl LayeredBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            document: LayeredDocument {
                metadata: DocumentMetadata {
                    name: Some(name.to_string()),
                    version: Some("1.0".to_string()),
                    description: None,
                },
                ..Default::default()
            },
        }
    }

    /// Unnamed document, for validation tests
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn base(mut self, fill: impl FnOnce(&mut ConfigurationSections)) -> Self {
        fill(&mut self.document.base);
        self
    }

    pub fn shared(mut self, fill: impl FnOnce(&mut ConfigurationSections)) -> Self {
        fill(self.document.shared.get_or_insert_with(Default::default));
        self
    }

    /// Add a machine-specific layer
    pub fn layer(
        mut self,
        name: &str,
        priority: Option<i64>,
        selectors: Vec<MachineSelector>,
        fill: impl FnOnce(&mut ConfigurationSections),
    ) -> Self {
        let mut sections = ConfigurationSections::default();
        fill(&mut sections);
        self.document.machine_specific.push(MachineSpecificLayer {
            name: name.to_string(),
            machine_selectors: selectors,
            priority,
            merge_strategy: None,
            sections,
        });
        self
    }

    /// Set the merge strategy of the most recently added layer
    pub fn strategy(mut self, strategy: MergeStrategy) -> Self {
        if let Some(layer) = self.document.machine_specific.last_mut() {
            layer.merge_strategy = Some(strategy);
        }
        self
    }

    pub fn rule(mut self, rule: InheritanceRule) -> Self {
        self.document.inheritance_rules.push(rule);
        self
    }

    pub fn conditional(mut self, section: ConditionalSection) -> Self {
        self.document.conditional_sections.push(section);
        self
    }

    pub fn build(self) -> LayeredDocument {
        self.document
    }
}

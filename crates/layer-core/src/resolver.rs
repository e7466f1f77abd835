//! Resolution of a layered document for one machine
//!
//! The pipeline runs strictly in order:
//!
//! 1. base items are loaded and tagged `base`
//! 2. the shared layer is appended
//! 3. applicable machine-specific layers are merged by priority
//! 4. inheritance rules run in document order
//! 5. satisfied conditional sections are appended
//! 6. the result is validated at the configured level

use crate::conditional::ConditionalApplier;
use crate::config::InheritanceSettings;
use crate::merge::ConfigurationMerger;
use crate::rules::RuleEngine;
use crate::scripts::ScriptRegistry;
use crate::selector::SelectorEvaluator;
use crate::validation::{ConfigurationValidator, ValidationReport};
use crate::{Error, Result};
use layer_meta::{
    ConfigurationDocument, FallbackStrategy, InheritanceSource, LayeredDocument, MachineContext,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of a resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStage {
    Init,
    BaseLoaded,
    SharedMerged,
    MachineMerged,
    RulesApplied,
    ConditionalsApplied,
    Validated,
    Done,
    /// Terminal state after a fatal error
    Failed,
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Init => "init",
            Self::BaseLoaded => "base_loaded",
            Self::SharedMerged => "shared_merged",
            Self::MachineMerged => "machine_merged",
            Self::RulesApplied => "rules_applied",
            Self::ConditionalsApplied => "conditionals_applied",
            Self::Validated => "validated",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// What a run did, for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub machine_name: String,

    /// Every stage reached, in order
    pub stages: Vec<ResolutionStage>,

    /// Machine-specific layers in merge order
    pub applied_layers: Vec<String>,

    pub applied_rules: Vec<String>,

    pub applied_conditionals: Vec<String>,

    pub validation: Option<ValidationReport>,
}

/// Output of a successful run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub document: ConfigurationDocument,
    pub report: ResolutionReport,
}

/// State owned by a single run and threaded through every stage
#[derive(Debug)]
pub struct ResolutionContext<'a> {
    machine: &'a MachineContext,
    stage: ResolutionStage,
    document: ConfigurationDocument,
    report: ResolutionReport,
}

impl<'a> ResolutionContext<'a> {
    fn new(machine: &'a MachineContext) -> Self {
        Self {
            machine,
            stage: ResolutionStage::Init,
            document: ConfigurationDocument::default(),
            report: ResolutionReport {
                machine_name: machine.machine_name().to_string(),
                stages: vec![ResolutionStage::Init],
                ..Default::default()
            },
        }
    }

    pub fn machine(&self) -> &'a MachineContext {
        self.machine
    }

    pub fn stage(&self) -> ResolutionStage {
        self.stage
    }

    pub fn document(&self) -> &ConfigurationDocument {
        &self.document
    }

    fn advance(&mut self, next: ResolutionStage) {
        tracing::debug!(
            from = %self.stage,
            to = %next,
            items = self.document.item_count(),
            "Resolution stage transition"
        );
        self.stage = next;
        self.report.stages.push(next);
    }

    /// Move to `Failed`, wrapping `error` with the last stage reached
    fn fail(&mut self, error: Error) -> Error {
        let stage = self.stage;
        tracing::warn!(%stage, error = %error, "Resolution failed");
        self.stage = ResolutionStage::Failed;
        self.report.stages.push(ResolutionStage::Failed);
        Error::Resolution {
            stage,
            source: Box::new(error),
        }
    }

    fn finish(mut self) -> Resolution {
        self.advance(ResolutionStage::Done);
        Resolution {
            document: self.document,
            report: self.report,
        }
    }
}

/// Resolves layered documents with fixed settings and scripts
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    settings: InheritanceSettings,
    scripts: ScriptRegistry,
}

impl Resolver {
    pub fn new(settings: InheritanceSettings) -> Self {
        Self {
            settings,
            scripts: ScriptRegistry::default(),
        }
    }

    /// Scripts and external lookups referenced by documents
    pub fn with_scripts(mut self, scripts: ScriptRegistry) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn settings(&self) -> &InheritanceSettings {
        &self.settings
    }

    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    /// Resolve `layered` for the machine described by `context`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] carrying the last stage reached when a
    /// merge fails or validation rejects the result.
    pub fn resolve(&self, layered: &LayeredDocument, context: &MachineContext) -> Result<Resolution> {
        tracing::info!(
            document = ?layered.metadata.name,
            machine = %context.machine_name(),
            "Resolving configuration"
        );

        let mut run = ResolutionContext::new(context);
        match self.run(&mut run, layered) {
            Ok(()) => {
                let resolution = run.finish();
                tracing::info!(
                    items = resolution.document.item_count(),
                    layers = resolution.report.applied_layers.len(),
                    rules = resolution.report.applied_rules.len(),
                    conditionals = resolution.report.applied_conditionals.len(),
                    "Resolved configuration"
                );
                Ok(resolution)
            }
            Err(e) => Err(run.fail(e)),
        }
    }

    /// Collect the current machine's context, then resolve
    pub fn resolve_for_current_machine(&self, layered: &LayeredDocument) -> Result<Resolution> {
        let context = crate::context::collect();
        self.resolve(layered, &context)
    }

    fn run(&self, run: &mut ResolutionContext<'_>, layered: &LayeredDocument) -> Result<()> {
        let evaluator = SelectorEvaluator::new(run.machine(), &self.scripts);
        let merger = ConfigurationMerger::new(&self.settings);

        self.load_base(run, layered);
        run.advance(ResolutionStage::BaseLoaded);

        if let Some(shared) = &layered.shared {
            merger.merge_shared(&mut run.document.sections, shared);
        }
        run.advance(ResolutionStage::SharedMerged);

        let layers =
            merger.merge_machine_layers(&mut run.document.sections, &layered.machine_specific, &evaluator)?;
        if layers.is_empty() {
            self.apply_fallback(run);
        }
        run.report.applied_layers = layers;
        run.advance(ResolutionStage::MachineMerged);

        let rules = RuleEngine::new(evaluator, *merger.resolver())
            .apply(&mut run.document.sections, &layered.inheritance_rules)?;
        run.report.applied_rules = rules;
        run.advance(ResolutionStage::RulesApplied);

        let conditionals = ConditionalApplier::new(evaluator)
            .apply(&mut run.document.sections, &layered.conditional_sections);
        run.report.applied_conditionals = conditionals;
        run.advance(ResolutionStage::ConditionalsApplied);

        let validation = ConfigurationValidator::new(self.settings.validation_level.clone())
            .validate(&run.document)?;
        run.report.validation = Some(validation);
        run.advance(ResolutionStage::Validated);

        Ok(())
    }

    fn load_base(&self, run: &mut ResolutionContext<'_>, layered: &LayeredDocument) {
        let mut base = layered.base.clone();
        let priority = InheritanceSource::Base.default_priority().unwrap_or(30);
        base.for_each_metadata_mut(|meta| meta.stamp(InheritanceSource::Base, priority));

        tracing::debug!(items = base.item_count(), "Loaded base layer");
        run.document = ConfigurationDocument::new(layered.metadata.clone(), base);
    }

    fn apply_fallback(&self, run: &mut ResolutionContext<'_>) {
        match &self.settings.fallback_strategy {
            FallbackStrategy::UseShared => {
                tracing::debug!("No machine-specific layer applied, keeping shared items");
            }
            FallbackStrategy::UseBase => {
                let before = run.document.item_count();
                run.document
                    .sections
                    .retain_by_metadata(|meta| !meta.is_from(&InheritanceSource::Shared));
                tracing::info!(
                    dropped = before - run.document.item_count(),
                    "No machine-specific layer applied, falling back to base items"
                );
            }
            FallbackStrategy::Unrecognized(raw) => {
                tracing::warn!(strategy = %raw, "Unknown fallback strategy, keeping shared items");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_meta::{
        ConfigurationSections, FileItem, MachineSelector, MachineSpecificLayer, ValidationLevel,
    };
    use pretty_assertions::assert_eq;

    fn file(name: &str, path: &str) -> FileItem {
        FileItem {
            name: name.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    fn layered() -> LayeredDocument {
        LayeredDocument {
            base: ConfigurationSections {
                files: vec![file("hosts", "/etc/hosts")],
                ..Default::default()
            },
            shared: Some(ConfigurationSections {
                files: vec![file("gitconfig", "~/.gitconfig")],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_stages_are_recorded_in_order() {
        let ctx = MachineContext::builder("host").build();
        let resolution = Resolver::default().resolve(&layered(), &ctx).unwrap();

        assert_eq!(
            resolution.report.stages,
            vec![
                ResolutionStage::Init,
                ResolutionStage::BaseLoaded,
                ResolutionStage::SharedMerged,
                ResolutionStage::MachineMerged,
                ResolutionStage::RulesApplied,
                ResolutionStage::ConditionalsApplied,
                ResolutionStage::Validated,
                ResolutionStage::Done,
            ]
        );
        assert_eq!(resolution.report.machine_name, "host");
        assert_eq!(resolution.document.item_count(), 2);
    }

    #[test]
    fn test_fallback_use_base_drops_shared_items() {
        let ctx = MachineContext::builder("host").build();
        let settings = InheritanceSettings {
            fallback_strategy: FallbackStrategy::UseBase,
            ..Default::default()
        };
        let resolution = Resolver::new(settings).resolve(&layered(), &ctx).unwrap();

        assert_eq!(resolution.document.sections.files.len(), 1);
        assert_eq!(resolution.document.sections.files[0].name, "hosts");
    }

    #[test]
    fn test_fallback_only_applies_without_machine_layers() {
        let ctx = MachineContext::builder("host").build();
        let mut doc = layered();
        doc.machine_specific.push(MachineSpecificLayer {
            name: "everyone".to_string(),
            machine_selectors: vec![MachineSelector::hostname_pattern("*")],
            priority: None,
            merge_strategy: None,
            sections: ConfigurationSections::default(),
        });
        let settings = InheritanceSettings {
            fallback_strategy: FallbackStrategy::UseBase,
            ..Default::default()
        };
        let resolution = Resolver::new(settings).resolve(&doc, &ctx).unwrap();

        assert_eq!(resolution.report.applied_layers, vec!["everyone"]);
        assert_eq!(resolution.document.sections.files.len(), 2);
    }

    #[test]
    fn test_validation_failure_reports_stage() {
        let ctx = MachineContext::builder("host").build();
        let settings = InheritanceSettings {
            validation_level: ValidationLevel::Relaxed,
            ..Default::default()
        };
        let err = Resolver::new(settings)
            .resolve(&LayeredDocument::default(), &ctx)
            .unwrap_err();

        assert_eq!(err.stage(), Some(ResolutionStage::ConditionalsApplied));
        assert!(matches!(
            err,
            Error::Resolution { ref source, .. } if matches!(**source, Error::EmptyConfiguration)
        ));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ResolutionStage::MachineMerged.to_string(), "machine_merged");
        assert!(ResolutionStage::Init < ResolutionStage::Done);
    }
}

//! Layer merging: shared layer, then machine-specific layers by priority

use super::conflict::ConflictResolver;
use crate::config::InheritanceSettings;
use crate::selector::SelectorEvaluator;
use crate::{Error, Result};
use layer_meta::{
    ConfigurationSections, InheritanceSource, MachineSpecificLayer, MergeStrategy, SectionItem,
};

/// Merges layers into the resolved sections
#[derive(Debug, Clone)]
pub struct ConfigurationMerger {
    resolver: ConflictResolver,
    default_strategy: MergeStrategy,
}

impl ConfigurationMerger {
    pub fn new(settings: &InheritanceSettings) -> Self {
        Self {
            resolver: ConflictResolver::new(settings.machine_precedence),
            default_strategy: settings.inheritance_mode.clone(),
        }
    }

    pub fn resolver(&self) -> &ConflictResolver {
        &self.resolver
    }

    /// Append the shared layer after the existing items
    pub fn merge_shared(&self, resolved: &mut ConfigurationSections, shared: &ConfigurationSections) {
        let mut shared = shared.clone();
        let priority = InheritanceSource::Shared.default_priority().unwrap_or(50);
        shared.for_each_metadata_mut(|meta| meta.stamp(InheritanceSource::Shared, priority));

        tracing::debug!(items = shared.item_count(), "Merging shared layer");
        resolved.append(shared);
    }

    /// Merge every applicable machine-specific layer
    ///
    /// A layer applies when at least one of its selectors matches. Applicable
    /// layers are merged highest priority first; layers with equal priority
    /// keep document order. Returns the names of merged layers in order.
    pub fn merge_machine_layers(
        &self,
        resolved: &mut ConfigurationSections,
        layers: &[MachineSpecificLayer],
        evaluator: &SelectorEvaluator<'_>,
    ) -> Result<Vec<String>> {
        let mut applicable: Vec<&MachineSpecificLayer> = layers
            .iter()
            .filter(|layer| {
                let applies = evaluator.any_match(&layer.machine_selectors);
                tracing::debug!(layer = %layer.name, applies, "Evaluated machine-specific layer");
                applies
            })
            .collect();

        // Stable, so equal priorities keep document order
        applicable.sort_by_key(|layer| std::cmp::Reverse(layer.effective_priority()));

        let mut applied = Vec::with_capacity(applicable.len());
        for layer in applicable {
            let strategy = layer
                .merge_strategy
                .as_ref()
                .unwrap_or(&self.default_strategy);
            self.merge_machine_layer(resolved, layer, strategy)?;
            tracing::info!(
                layer = %layer.name,
                priority = layer.effective_priority(),
                %strategy,
                "Applied machine-specific layer"
            );
            applied.push(layer.name.clone());
        }
        Ok(applied)
    }

    /// Merge one machine-specific layer using `strategy`
    pub fn merge_machine_layer(
        &self,
        resolved: &mut ConfigurationSections,
        layer: &MachineSpecificLayer,
        strategy: &MergeStrategy,
    ) -> Result<()> {
        let priority = layer.effective_priority();
        let mut incoming = layer.sections.clone();
        incoming.for_each_metadata_mut(|meta| meta.stamp(InheritanceSource::MachineSpecific, priority));

        let deep = MergeStrategy::DeepMerge;
        let strategy = match strategy {
            MergeStrategy::Unrecognized(raw) => {
                tracing::warn!(
                    layer = %layer.name,
                    strategy = %raw,
                    "Unknown merge strategy, using deep merge"
                );
                &deep
            }
            known => known,
        };

        let ConfigurationSections {
            files,
            registry,
            applications,
            prerequisites,
            stages,
        } = incoming;

        self.merge_section(&mut resolved.files, files, strategy, &layer.name)?;
        self.merge_section(&mut resolved.registry, registry, strategy, &layer.name)?;
        self.merge_section(&mut resolved.applications, applications, strategy, &layer.name)?;
        self.merge_section(&mut resolved.prerequisites, prerequisites, strategy, &layer.name)?;
        self.merge_section(&mut resolved.stages, stages, strategy, &layer.name)?;
        Ok(())
    }

    fn merge_section<T: SectionItem>(
        &self,
        existing: &mut Vec<T>,
        incoming: Vec<T>,
        strategy: &MergeStrategy,
        layer: &str,
    ) -> Result<()> {
        if incoming.is_empty() {
            return Ok(());
        }

        match strategy {
            MergeStrategy::Replace => {
                tracing::debug!(section = %T::KIND, layer, replaced = existing.len(), "Replacing section");
                *existing = incoming;
            }
            MergeStrategy::ShallowMerge => existing.extend(incoming),
            _ => {
                for item in incoming {
                    match find_pair(existing, &item) {
                        Some(index) => {
                            let winner = self
                                .resolver
                                .resolve(&existing[index], &item)
                                .map_err(|e| in_layer(e, layer))?;
                            existing[index] = winner;
                        }
                        None => existing.push(item),
                    }
                }
            }
        }
        Ok(())
    }
}

/// Index of the existing item `incoming` pairs with
///
/// Same name first, otherwise the first item sharing an inheritance tag.
pub fn find_pair<T: SectionItem>(existing: &[T], incoming: &T) -> Option<usize> {
    if !incoming.name().is_empty() {
        if let Some(index) = existing.iter().position(|item| item.name() == incoming.name()) {
            return Some(index);
        }
    }
    existing
        .iter()
        .position(|item| item.inheritance().shares_tag_with(incoming.inheritance()))
}

fn in_layer(error: Error, layer: &str) -> Error {
    match error {
        Error::Merge { item, reason, .. } => Error::Merge {
            layer: layer.to_string(),
            item,
            reason,
        },
        other => other,
    }
}

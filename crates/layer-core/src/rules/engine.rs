//! Rule evaluation over the resolved sections
//!
//! Rules run in document order. Each one is gated by its condition, then
//! split per target section into matching and non-matching items; only the
//! matching items reach the action.

use crate::merge::ConflictResolver;
use crate::selector::SelectorEvaluator;
use crate::{Error, Result};
use layer_meta::{
    ConfigurationSections, InheritanceRule, RuleAction, SectionItem, SectionKind, fields,
};

/// Merge level used when a `merge` rule does not set one
const DEFAULT_MERGE_LEVEL: &str = "value";

/// What an action did to the matching items of one section
enum Outcome<T> {
    /// Put the items back after the non-matching ones
    Recombine(Vec<T>),
    /// Replace the whole section with these items
    Only(Vec<T>),
    /// Leave the section as it was
    Skipped(String),
}

/// Applies inheritance rules to the resolved sections
#[derive(Debug, Clone, Copy)]
pub struct RuleEngine<'a> {
    evaluator: SelectorEvaluator<'a>,
    resolver: ConflictResolver,
}

impl<'a> RuleEngine<'a> {
    pub fn new(evaluator: SelectorEvaluator<'a>, resolver: ConflictResolver) -> Self {
        Self { evaluator, resolver }
    }

    /// Apply `rules` in order, returning the names of those that ran
    ///
    /// Only merge failures inside a `merge` rule abort; every other problem
    /// is logged and the affected section is left as it was.
    pub fn apply(
        &self,
        sections: &mut ConfigurationSections,
        rules: &[InheritanceRule],
    ) -> Result<Vec<String>> {
        let mut applied = Vec::new();
        for rule in rules {
            if !rule.action.is_recognized() {
                tracing::warn!(rule = %rule.name, action = %rule.action, "Unknown rule action, skipping rule");
                continue;
            }
            if !self.is_applicable(rule, sections) {
                tracing::debug!(rule = %rule.name, "Rule condition not met");
                continue;
            }

            for kind in rule.target_sections() {
                match kind {
                    SectionKind::Files => self.apply_to_section(rule, &mut sections.files)?,
                    SectionKind::Registry => self.apply_to_section(rule, &mut sections.registry)?,
                    SectionKind::Applications => {
                        self.apply_to_section(rule, &mut sections.applications)?
                    }
                    SectionKind::Prerequisites => {
                        self.apply_to_section(rule, &mut sections.prerequisites)?
                    }
                    SectionKind::Stages => self.apply_to_section(rule, &mut sections.stages)?,
                    SectionKind::Unrecognized(raw) => {
                        tracing::warn!(rule = %rule.name, section = %raw, "Rule targets an unknown section");
                    }
                }
            }

            tracing::info!(rule = %rule.name, action = %rule.action, "Applied inheritance rule");
            applied.push(rule.name.clone());
        }
        Ok(applied)
    }

    /// Whether the rule's condition holds
    ///
    /// Tag conditions need at least one tagged item in a target section;
    /// selector conditions need one matching selector. Both must hold when
    /// both are given.
    pub fn is_applicable(&self, rule: &InheritanceRule, sections: &ConfigurationSections) -> bool {
        let Some(condition) = &rule.condition else {
            return true;
        };

        let tags_hold = condition.inheritance_tags.is_empty()
            || rule
                .target_sections()
                .iter()
                .any(|kind| sections.any_tagged(kind, &condition.inheritance_tags));

        let selectors_hold = condition.machine_selectors.is_empty()
            || self.evaluator.any_match(&condition.machine_selectors);

        tags_hold && selectors_hold
    }

    fn apply_to_section<T: SectionItem>(&self, rule: &InheritanceRule, items: &mut Vec<T>) -> Result<()> {
        let tags = rule.match_tags();
        let (matching, others): (Vec<T>, Vec<T>) = items
            .iter()
            .cloned()
            .partition(|item| tags.is_none_or(|tags| item.inheritance().has_any_tag(tags)));

        if matching.is_empty() {
            return Ok(());
        }

        let matched = matching.len();
        let outcome = match &rule.action {
            RuleAction::Merge => self.merge(rule, matching)?,
            RuleAction::Replace => replace(rule, matching),
            RuleAction::Transform => self.transform(rule, matching),
            RuleAction::Validate => self.validate(rule, matching),
            RuleAction::Unrecognized(raw) => Outcome::Skipped(format!("unknown action '{raw}'")),
        };

        match outcome {
            Outcome::Recombine(result) => {
                tracing::debug!(rule = %rule.name, section = %T::KIND, matched, kept = result.len(), "Rule updated section");
                *items = others;
                items.extend(result);
            }
            Outcome::Only(result) => {
                tracing::debug!(rule = %rule.name, section = %T::KIND, matched, kept = result.len(), "Rule replaced section");
                *items = result;
            }
            Outcome::Skipped(reason) => {
                tracing::warn!(rule = %rule.name, section = %T::KIND, %reason, "Rule skipped for section");
            }
        }
        Ok(())
    }

    /// Collapse items that share a target into one
    fn merge<T: SectionItem>(&self, rule: &InheritanceRule, matching: Vec<T>) -> Result<Outcome<T>> {
        let level = rule
            .parameters
            .merge_level
            .as_deref()
            .unwrap_or(DEFAULT_MERGE_LEVEL);
        if !level.eq_ignore_ascii_case(DEFAULT_MERGE_LEVEL) {
            return Ok(Outcome::Skipped(format!("unsupported merge level '{level}'")));
        }

        let mut groups: Vec<(String, T)> = Vec::new();
        for item in matching {
            let target = item.target().into_owned();
            match groups.iter_mut().find(|(key, _)| *key == target) {
                Some((_, survivor)) => {
                    let winner = self
                        .resolver
                        .resolve(&*survivor, &item)
                        .map_err(|e| match e {
                            Error::Merge { item: name, reason, .. } => Error::Merge {
                                layer: format!("rule '{}'", rule.name),
                                item: name,
                                reason,
                            },
                            other => other,
                        })?;
                    *survivor = winner;
                }
                None => groups.push((target, item)),
            }
        }
        Ok(Outcome::Recombine(groups.into_iter().map(|(_, item)| item).collect()))
    }

    fn transform<T: SectionItem>(&self, rule: &InheritanceRule, matching: Vec<T>) -> Outcome<T> {
        let (name, only) = match (&rule.parameters.transform_script, &rule.script) {
            (Some(name), _) => (name, false),
            (None, Some(name)) => (name, true),
            (None, None) => return Outcome::Skipped("no transform script".to_string()),
        };
        let Some(script) = self.evaluator.scripts().transform(name) else {
            return Outcome::Skipped(format!("transform script '{name}' is not registered"));
        };

        let context = self.evaluator.context();
        let transformed = matching
            .into_iter()
            .map(|item| match script.transform(item.clone().into_item(), context) {
                Ok(output) => {
                    let kind = output.kind();
                    T::from_item(output).unwrap_or_else(|| {
                        tracing::warn!(
                            rule = %rule.name,
                            item = item.name(),
                            from = %T::KIND,
                            to = %kind,
                            "Transform changed the item kind, keeping original"
                        );
                        item
                    })
                }
                Err(e) => {
                    tracing::warn!(rule = %rule.name, item = item.name(), error = %e, "Transform failed, keeping original");
                    item
                }
            })
            .collect();

        if only {
            Outcome::Only(transformed)
        } else {
            Outcome::Recombine(transformed)
        }
    }

    /// Drop items that miss required properties or fail the validator
    fn validate<T: SectionItem>(&self, rule: &InheritanceRule, matching: Vec<T>) -> Outcome<T> {
        let required = &rule.parameters.required_properties;
        let validator = match &rule.parameters.validation_script {
            Some(name) => match self.evaluator.scripts().validator(name) {
                Some(validator) => Some(validator),
                None => {
                    return Outcome::Skipped(format!("validation script '{name}' is not registered"));
                }
            },
            None if required.is_empty() => {
                return Outcome::Skipped("no required properties or validation script".to_string());
            }
            None => None,
        };

        let context = self.evaluator.context();
        let kept = matching
            .into_iter()
            .filter(|item| {
                let missing: Vec<&str> = required
                    .iter()
                    .filter(|field| !fields::has_property(item, field).unwrap_or(false))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    tracing::info!(rule = %rule.name, item = item.name(), ?missing, "Dropping item missing required properties");
                    return false;
                }

                let Some(validator) = validator else {
                    return true;
                };
                match validator.validate(&item.clone().into_item(), context) {
                    Ok(true) => true,
                    Ok(false) => {
                        tracing::info!(rule = %rule.name, item = item.name(), "Dropping item rejected by validator");
                        false
                    }
                    Err(e) => {
                        tracing::warn!(rule = %rule.name, item = item.name(), error = %e, "Validator failed, dropping item");
                        false
                    }
                }
            })
            .collect();
        Outcome::Recombine(kept)
    }
}

fn replace<T: SectionItem>(rule: &InheritanceRule, matching: Vec<T>) -> Outcome<T> {
    let values = &rule.parameters.replacement_values;
    if values.is_empty() {
        return Outcome::Skipped("no replacement values".to_string());
    }

    let mut replaced = Vec::with_capacity(matching.len());
    for item in &matching {
        match fields::with_fields(item, values) {
            Ok(updated) => replaced.push(updated),
            Err(e) => return Outcome::Skipped(e.to_string()),
        }
    }
    Outcome::Recombine(replaced)
}

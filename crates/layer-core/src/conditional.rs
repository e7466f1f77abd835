//! Conditional sections injected when their predicates hold

use crate::selector::SelectorEvaluator;
use layer_meta::{
    Condition, ConditionLogic, ConditionType, ConditionalSection, ConfigurationSections,
    InheritanceSource,
};

/// Evaluates conditional sections and appends the satisfied ones
#[derive(Debug, Clone, Copy)]
pub struct ConditionalApplier<'a> {
    evaluator: SelectorEvaluator<'a>,
}

impl<'a> ConditionalApplier<'a> {
    pub fn new(evaluator: SelectorEvaluator<'a>) -> Self {
        Self { evaluator }
    }

    /// Append every satisfied section, returning the names of those applied
    pub fn apply(
        &self,
        resolved: &mut ConfigurationSections,
        sections: &[ConditionalSection],
    ) -> Vec<String> {
        let mut applied = Vec::new();
        for section in sections {
            if !self.is_satisfied(section) {
                tracing::debug!(section = %section.name, "Conditional section not satisfied");
                continue;
            }

            let mut items = section.sections.clone();
            let priority = InheritanceSource::Conditional.default_priority().unwrap_or(70);
            items.for_each_metadata_mut(|meta| {
                meta.stamp(InheritanceSource::Conditional, priority);
                meta.add_tag(section.name.clone());
            });

            tracing::info!(
                section = %section.name,
                items = items.item_count(),
                "Applied conditional section"
            );
            resolved.append(items);
            applied.push(section.name.clone());
        }
        applied
    }

    /// Combine every predicate result with the section's logic
    ///
    /// All predicates are evaluated, even once the outcome is known.
    pub fn is_satisfied(&self, section: &ConditionalSection) -> bool {
        let results: Vec<bool> = section
            .conditions
            .iter()
            .map(|condition| self.evaluate(condition))
            .collect();

        match &section.logic {
            ConditionLogic::And => results.iter().all(|r| *r),
            ConditionLogic::Or => results.iter().any(|r| *r),
            ConditionLogic::Not => !results.iter().any(|r| *r),
            ConditionLogic::Unrecognized(raw) => {
                tracing::warn!(section = %section.name, logic = %raw, "Unknown condition logic, section not applied");
                false
            }
        }
    }

    /// Evaluate one predicate; missing fields and unknown types are false
    pub fn evaluate(&self, condition: &Condition) -> bool {
        let cs = condition.case_sensitive;
        let op = condition.operator.as_ref();
        match &condition.condition_type {
            ConditionType::CustomScript => match condition.script.as_deref() {
                Some(script) => {
                    self.evaluator
                        .evaluate_script(script, condition.expected_result.as_ref(), op, cs)
                }
                None => missing(condition, "script"),
            },
            ConditionType::HardwareCheck => match condition.check.as_deref() {
                Some(fact) => self
                    .evaluator
                    .evaluate_fact(fact, op, condition.value.as_deref(), cs),
                None => missing(condition, "check"),
            },
            ConditionType::EnvironmentVariable => match condition.check.as_deref() {
                Some(name) => self
                    .evaluator
                    .evaluate_environment(name, op, condition.value.as_deref(), cs),
                None => missing(condition, "check"),
            },
            ConditionType::MachineSelector => match &condition.selector {
                Some(selector) => self.evaluator.evaluate(selector),
                None => missing(condition, "selector"),
            },
            ConditionType::Unrecognized(raw) => {
                tracing::warn!(condition_type = %raw, "Unknown condition type, treating as false");
                false
            }
        }
    }
}

fn missing(condition: &Condition, field: &str) -> bool {
    tracing::warn!(
        condition_type = %condition.condition_type,
        field,
        "Condition is missing a required field, treating as false"
    );
    false
}

//! Picking a winner when two layers contribute the same item

use crate::{Error, Result};
use layer_meta::{ConflictPolicy, InheritanceSource, SectionItem, fields};

/// Resolves a conflict between an existing item and an incoming one
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver {
    machine_precedence: bool,
}

impl ConflictResolver {
    pub fn new(machine_precedence: bool) -> Self {
        Self { machine_precedence }
    }

    /// The policy that governs this pair
    ///
    /// Incoming policy first, then existing, then the global precedence
    /// setting. A blank policy value is malformed.
    pub fn policy_for<T: SectionItem>(&self, existing: &T, incoming: &T) -> Result<ConflictPolicy> {
        let explicit = incoming
            .inheritance()
            .conflict_resolution
            .as_ref()
            .or(existing.inheritance().conflict_resolution.as_ref());

        match explicit {
            Some(ConflictPolicy::Unrecognized(raw)) if raw.trim().is_empty() => {
                Err(Error::MalformedPolicy {
                    item: incoming.name().to_string(),
                    value: raw.clone(),
                })
            }
            Some(policy) => Ok(policy.clone()),
            None if self.machine_precedence => Ok(ConflictPolicy::MachineWins),
            None => Ok(ConflictPolicy::SharedWins),
        }
    }

    /// Merge `incoming` into `existing`, returning the surviving item
    pub fn resolve<T: SectionItem>(&self, existing: &T, incoming: &T) -> Result<T> {
        let policy = self.policy_for(existing, incoming)?;
        let existing_meta = existing.inheritance();
        let incoming_meta = incoming.inheritance();
        let machine = InheritanceSource::MachineSpecific;

        let keep_incoming = match &policy {
            ConflictPolicy::MachineWins => {
                match (incoming_meta.is_from(&machine), existing_meta.is_from(&machine)) {
                    (true, false) => true,
                    (true, true) => {
                        incoming_meta.effective_priority() > existing_meta.effective_priority()
                    }
                    _ => {
                        self.machine_precedence
                            && incoming_meta.effective_priority() > existing_meta.effective_priority()
                    }
                }
            }
            ConflictPolicy::SharedWins => !existing_meta.is_from(&InheritanceSource::Shared),
            ConflictPolicy::MergeBoth => {
                let merged = fields::overlay(existing, incoming).map_err(|e| Error::Merge {
                    layer: source_label(incoming),
                    item: incoming.name().to_string(),
                    reason: e.to_string(),
                })?;
                tracing::debug!(
                    section = %T::KIND,
                    item = incoming.name(),
                    "Merged fields of conflicting items"
                );
                return Ok(merged);
            }
            ConflictPolicy::Priority => {
                incoming_meta.effective_priority() > existing_meta.effective_priority()
            }
            ConflictPolicy::Unrecognized(raw) => {
                tracing::warn!(
                    policy = %raw,
                    item = incoming.name(),
                    "Unknown conflict resolution policy, comparing priorities"
                );
                incoming_meta.effective_priority() > existing_meta.effective_priority()
            }
        };

        tracing::debug!(
            section = %T::KIND,
            item = incoming.name(),
            %policy,
            winner = if keep_incoming { "incoming" } else { "existing" },
            "Resolved item conflict"
        );

        Ok(if keep_incoming {
            incoming.clone()
        } else {
            existing.clone()
        })
    }
}

fn source_label<T: SectionItem>(item: &T) -> String {
    item.inheritance()
        .inheritance_source
        .as_ref()
        .map_or_else(|| "unknown layer".to_string(), ToString::to_string)
}

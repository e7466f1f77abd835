//! Validation of the resolved document
//!
//! | level      | checks                                              | on failure   |
//! |------------|-----------------------------------------------------|--------------|
//! | `strict`   | everything below                                    | error        |
//! | `moderate` | missing names, duplicate targets                    | warnings     |
//! | `relaxed`  | the document has at least one item                  | error        |

use crate::{Error, Result};
use layer_meta::{
    ConfigurationDocument, ConfigurationSections, InheritanceSource, SectionItem, SectionKind,
    ValidationLevel, fields,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Accepted range for explicit item priorities
pub const PRIORITY_RANGE: std::ops::RangeInclusive<i64> = 1..=100;

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The document has no `metadata.name`
    MissingDocumentName,
    MissingName,
    MissingTarget,
    /// A required field of the item kind is absent
    MissingField,
    /// Two items in one section share a name
    DuplicateName,
    /// Two items act on the same target
    DuplicateTarget,
    /// `inheritance_source` is not one of the four known sources
    UnknownSource,
    PriorityOutOfRange,
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::MissingDocumentName => "missing document name",
            Self::MissingName => "missing name",
            Self::MissingTarget => "missing target",
            Self::MissingField => "missing field",
            Self::DuplicateName => "duplicate name",
            Self::DuplicateTarget => "duplicate target",
            Self::UnknownSource => "unknown inheritance source",
            Self::PriorityOutOfRange => "priority out of range",
        };
        f.write_str(text)
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Section the item lives in, if the finding concerns an item
    pub section: Option<SectionKind>,
    pub item: Option<String>,
    /// Human-readable description
    pub message: String,
}

/// Findings from a validation pass that did not fail
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub level: ValidationLevel,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Findings of one kind
    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }
}

/// Checks a resolved document at one strictness level
#[derive(Debug, Clone)]
pub struct ConfigurationValidator {
    level: ValidationLevel,
}

impl ConfigurationValidator {
    pub fn new(level: ValidationLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> &ValidationLevel {
        &self.level
    }

    pub fn validate(&self, document: &ConfigurationDocument) -> Result<ValidationReport> {
        match &self.level {
            ValidationLevel::Strict => {
                let issues = strict_issues(document);
                if issues.is_empty() {
                    return Ok(ValidationReport {
                        level: ValidationLevel::Strict,
                        issues,
                    });
                }
                Err(Error::Validation {
                    level: ValidationLevel::Strict,
                    issues: issues.into_iter().map(|issue| issue.message).collect(),
                })
            }
            ValidationLevel::Relaxed => {
                if document.item_count() == 0 {
                    return Err(Error::EmptyConfiguration);
                }
                Ok(ValidationReport {
                    level: ValidationLevel::Relaxed,
                    issues: Vec::new(),
                })
            }
            ValidationLevel::Moderate => Ok(moderate_report(document)),
            ValidationLevel::Unrecognized(raw) => {
                tracing::warn!(level = %raw, "Unknown validation level, validating as moderate");
                Ok(moderate_report(document))
            }
        }
    }
}

fn moderate_report(document: &ConfigurationDocument) -> ValidationReport {
    let mut issues = Vec::new();
    check_sections(&document.sections, false, &mut issues);
    duplicate_targets(&document.sections, &mut issues);

    for issue in &issues {
        tracing::warn!(kind = %issue.kind, item = ?issue.item, "{}", issue.message);
    }
    ValidationReport {
        level: ValidationLevel::Moderate,
        issues,
    }
}

fn strict_issues(document: &ConfigurationDocument) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let named = document
        .metadata
        .name
        .as_deref()
        .is_some_and(|name| !name.trim().is_empty());
    if !named {
        issues.push(ValidationIssue {
            kind: IssueKind::MissingDocumentName,
            section: None,
            item: None,
            message: "document metadata has no name".to_string(),
        });
    }

    check_sections(&document.sections, true, &mut issues);
    duplicate_targets(&document.sections, &mut issues);
    issues
}

fn check_sections(sections: &ConfigurationSections, strict: bool, issues: &mut Vec<ValidationIssue>) {
    check_items(&sections.files, strict, issues);
    check_items(&sections.registry, strict, issues);
    check_items(&sections.applications, strict, issues);
    check_items(&sections.prerequisites, strict, issues);
    check_items(&sections.stages, strict, issues);
}

/// Per-item checks; only missing names are reported outside strict mode
fn check_items<T: SectionItem>(items: &[T], strict: bool, issues: &mut Vec<ValidationIssue>) {
    let mut names = HashSet::new();

    for (index, item) in items.iter().enumerate() {
        let name = item.name();
        if name.trim().is_empty() {
            issues.push(ValidationIssue {
                kind: IssueKind::MissingName,
                section: Some(T::KIND),
                item: None,
                message: format!("{} item #{} has no name", T::KIND, index + 1),
            });
        }
        if !strict {
            continue;
        }

        if item.target().trim().is_empty() {
            issues.push(item_issue(
                IssueKind::MissingTarget,
                item,
                format!("{} item '{}' has no {}", T::KIND, name, T::TARGET_FIELD),
            ));
        }

        let required = T::required_fields()
            .iter()
            .filter(|field| **field != "name" && **field != T::TARGET_FIELD);
        for field in required {
            if !fields::has_property(item, field).unwrap_or(false) {
                issues.push(item_issue(
                    IssueKind::MissingField,
                    item,
                    format!("{} item '{}' is missing '{}'", T::KIND, name, field),
                ));
            }
        }

        if !name.trim().is_empty() && !names.insert(name) {
            issues.push(item_issue(
                IssueKind::DuplicateName,
                item,
                format!("duplicate name '{}' in {}", name, T::KIND),
            ));
        }

        let meta = item.inheritance();
        if let Some(InheritanceSource::Unrecognized(raw)) = &meta.inheritance_source {
            issues.push(item_issue(
                IssueKind::UnknownSource,
                item,
                format!("{} item '{}' has unknown inheritance source '{}'", T::KIND, name, raw),
            ));
        }
        if let Some(priority) = meta.inheritance_priority.filter(|p| !PRIORITY_RANGE.contains(p)) {
            issues.push(item_issue(
                IssueKind::PriorityOutOfRange,
                item,
                format!(
                    "{} item '{}' has priority {} outside {}..={}",
                    T::KIND,
                    name,
                    priority,
                    PRIORITY_RANGE.start(),
                    PRIORITY_RANGE.end()
                ),
            ));
        }
    }
}

fn item_issue<T: SectionItem>(kind: IssueKind, item: &T, message: String) -> ValidationIssue {
    ValidationIssue {
        kind,
        section: Some(T::KIND),
        item: Some(item.name().to_string()),
        message,
    }
}

/// Targets must be unique across `files` and `registry`, and within every
/// other section
fn duplicate_targets(sections: &ConfigurationSections, issues: &mut Vec<ValidationIssue>) {
    let mut shared: HashMap<String, String> = HashMap::new();
    record_targets(&sections.files, &mut shared, issues);
    record_targets(&sections.registry, &mut shared, issues);

    record_targets(&sections.applications, &mut HashMap::new(), issues);
    record_targets(&sections.prerequisites, &mut HashMap::new(), issues);
    record_targets(&sections.stages, &mut HashMap::new(), issues);
}

fn record_targets<T: SectionItem>(
    items: &[T],
    seen: &mut HashMap<String, String>,
    issues: &mut Vec<ValidationIssue>,
) {
    for item in items {
        let target = item.target();
        if target.trim().is_empty() {
            continue;
        }
        match seen.get(&*target) {
            Some(first) => issues.push(item_issue(
                IssueKind::DuplicateTarget,
                item,
                format!(
                    "duplicate target '{}' ({} item '{}' and '{}')",
                    target,
                    T::KIND,
                    item.name(),
                    first
                ),
            )),
            None => {
                seen.insert(target.into_owned(), item.name().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_meta::{DocumentMetadata, FileItem, RegistryItem, StageItem};
    use pretty_assertions::assert_eq;

    fn complete_file(name: &str, path: &str) -> FileItem {
        FileItem {
            name: name.to_string(),
            path: path.to_string(),
            action: Some("backup".to_string()),
            dynamic_state_path: Some(format!("files/{name}")),
            ..Default::default()
        }
    }

    fn document(files: Vec<FileItem>) -> ConfigurationDocument {
        ConfigurationDocument::new(
            DocumentMetadata {
                name: Some("workstation".to_string()),
                ..Default::default()
            },
            ConfigurationSections {
                files,
                ..Default::default()
            },
        )
    }

    fn duplicated() -> ConfigurationDocument {
        document(vec![
            complete_file("app", "/etc/app.conf"),
            complete_file("app-copy", "/etc/app.conf"),
        ])
    }

    #[test]
    fn test_strict_rejects_duplicate_target() {
        let err = ConfigurationValidator::new(ValidationLevel::Strict)
            .validate(&duplicated())
            .unwrap_err();
        assert!(err.to_string().contains("/etc/app.conf"), "{err}");
    }

    #[test]
    fn test_moderate_reports_duplicate_target() {
        let report = ConfigurationValidator::new(ValidationLevel::Moderate)
            .validate(&duplicated())
            .unwrap();
        assert_eq!(report.of_kind(IssueKind::DuplicateTarget).count(), 1);
    }

    #[test]
    fn test_relaxed_accepts_duplicates() {
        let report = ConfigurationValidator::new(ValidationLevel::Relaxed)
            .validate(&duplicated())
            .unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_relaxed_rejects_empty_document() {
        let err = ConfigurationValidator::new(ValidationLevel::Relaxed)
            .validate(&document(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyConfiguration));
    }

    #[test]
    fn test_strict_accepts_complete_document() {
        let report = ConfigurationValidator::new(ValidationLevel::Strict)
            .validate(&document(vec![complete_file("hosts", "/etc/hosts")]))
            .unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_strict_lists_every_cause() {
        let mut doc = document(vec![
            FileItem {
                name: "bare".to_string(),
                path: "/etc/bare".to_string(),
                ..Default::default()
            },
            complete_file("", "/etc/anon"),
        ]);
        doc.metadata.name = None;
        doc.sections.stages.push(StageItem {
            name: "cleanup".to_string(),
            ..Default::default()
        });

        let err = ConfigurationValidator::new(ValidationLevel::Strict)
            .validate(&doc)
            .unwrap_err();
        let Error::Validation { issues, .. } = err else {
            panic!("expected validation error");
        };
        let text = issues.join("\n");
        assert!(text.contains("document metadata has no name"));
        assert!(text.contains("'bare' is missing 'action'"));
        assert!(text.contains("'bare' is missing 'dynamic_state_path'"));
        assert!(text.contains("files item #2 has no name"));
        assert!(text.contains("'cleanup' has no script_path"));
    }

    #[test]
    fn test_strict_checks_inheritance_metadata() {
        let mut odd_source = complete_file("a", "/a");
        odd_source.inheritance.inheritance_source = Some(InheritanceSource::from("upstream"));
        let mut odd_priority = complete_file("b", "/b");
        odd_priority.inheritance.inheritance_priority = Some(150);

        let err = ConfigurationValidator::new(ValidationLevel::Strict)
            .validate(&document(vec![odd_source, odd_priority]))
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("unknown inheritance source 'upstream'"));
        assert!(text.contains("priority 150"));
    }

    #[test]
    fn test_duplicate_target_across_files_and_registry() {
        let mut doc = document(vec![complete_file("file", "HKCU\\Software\\Vendor")]);
        doc.sections.registry.push(RegistryItem {
            name: "key".to_string(),
            path: "HKCU\\Software\\Vendor".to_string(),
            action: Some("sync".to_string()),
            dynamic_state_path: Some("registry/vendor.json".to_string()),
            ..Default::default()
        });

        let report = ConfigurationValidator::new(ValidationLevel::Moderate)
            .validate(&doc)
            .unwrap();
        let dup: Vec<_> = report.of_kind(IssueKind::DuplicateTarget).collect();
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].section, Some(SectionKind::Registry));
    }

    #[test]
    fn test_strict_rejects_duplicate_names() {
        let err = ConfigurationValidator::new(ValidationLevel::Strict)
            .validate(&document(vec![
                complete_file("same", "/one"),
                complete_file("same", "/two"),
            ]))
            .unwrap_err();
        assert!(err.to_string().contains("duplicate name 'same' in files"));
    }

    #[test]
    fn test_moderate_never_fails() {
        let report = ConfigurationValidator::new(ValidationLevel::Moderate)
            .validate(&document(vec![complete_file("", "/a")]))
            .unwrap();
        assert_eq!(report.of_kind(IssueKind::MissingName).count(), 1);

        let empty = ConfigurationValidator::new(ValidationLevel::Moderate)
            .validate(&document(Vec::new()))
            .unwrap();
        assert!(empty.is_clean());
    }
}

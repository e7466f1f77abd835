//! Selector and predicate evaluation
//!
//! Evaluation never fails. Anything that goes wrong (a missing variable, an
//! unreadable external value, a script error, a bad regex, an unknown
//! operator) is logged and counts as "does not match".

use crate::scripts::ScriptRegistry;
use glob::{MatchOptions, Pattern};
use layer_meta::{MachineContext, MachineSelector, Operator, SelectorType};
use regex::RegexBuilder;
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluates selectors and predicates against one machine context
#[derive(Debug, Clone, Copy)]
pub struct SelectorEvaluator<'a> {
    context: &'a MachineContext,
    scripts: &'a ScriptRegistry,
}

impl<'a> SelectorEvaluator<'a> {
    pub fn new(context: &'a MachineContext, scripts: &'a ScriptRegistry) -> Self {
        Self { context, scripts }
    }

    pub fn context(&self) -> &'a MachineContext {
        self.context
    }

    pub fn scripts(&self) -> &'a ScriptRegistry {
        self.scripts
    }

    /// OR-combination: true when at least one selector matches
    ///
    /// An empty list never matches.
    pub fn any_match(&self, selectors: &[MachineSelector]) -> bool {
        selectors.iter().any(|selector| self.evaluate(selector))
    }

    /// Evaluate a single selector
    pub fn evaluate(&self, selector: &MachineSelector) -> bool {
        let cs = selector.case_sensitive;
        let matched = match &selector.selector_type {
            SelectorType::MachineName => {
                let operator = selector.operator.clone().unwrap_or(Operator::Equals);
                match selector.value.as_deref() {
                    Some(expected) => {
                        compare(self.context.machine_name(), &operator, expected, cs).unwrap_or(false)
                    }
                    None => missing_field(selector, "value"),
                }
            }
            SelectorType::HostnamePattern => match selector.value.as_deref() {
                Some(pattern) => self.evaluate_hostname_pattern(selector.operator.as_ref(), pattern, cs),
                None => missing_field(selector, "value"),
            },
            SelectorType::EnvironmentVariable => match selector.value.as_deref() {
                Some(name) => self.evaluate_environment(
                    name,
                    selector.operator.as_ref(),
                    selector.expected_value.as_deref(),
                    cs,
                ),
                None => missing_field(selector, "value"),
            },
            SelectorType::ExternalValue => match selector.path.as_deref() {
                Some(path) => self.evaluate_external(
                    path,
                    selector.value.as_deref(),
                    selector.operator.as_ref(),
                    selector.expected_value.as_deref(),
                    cs,
                ),
                None => missing_field(selector, "path"),
            },
            SelectorType::Script => match selector.script.as_deref() {
                Some(script) => self.evaluate_script(
                    script,
                    selector.expected_result.as_ref(),
                    selector.operator.as_ref(),
                    cs,
                ),
                None => missing_field(selector, "script"),
            },
            SelectorType::Unrecognized(raw) => {
                tracing::warn!(selector_type = %raw, "Unknown selector type, treating as no match");
                false
            }
        };

        tracing::debug!(
            selector_type = %selector.selector_type,
            value = ?selector.value,
            matched,
            "Evaluated machine selector"
        );
        matched
    }

    fn evaluate_hostname_pattern(&self, operator: Option<&Operator>, pattern: &str, cs: bool) -> bool {
        let name = self.context.machine_name();
        match operator {
            None | Some(Operator::Equals) => wildcard_match(name, pattern, cs),
            Some(Operator::NotEquals) => !wildcard_match(name, pattern, cs),
            Some(other) => compare(name, other, pattern, cs).unwrap_or(false),
        }
    }

    /// Compare an environment variable with `expected`
    ///
    /// Without an expected value the check is for presence only. A missing
    /// variable is a non-match, not an error.
    pub fn evaluate_environment(
        &self,
        name: &str,
        operator: Option<&Operator>,
        expected: Option<&str>,
        case_sensitive: bool,
    ) -> bool {
        let Some(actual) = self.context.env_var(name, case_sensitive) else {
            tracing::debug!(variable = name, "Environment variable not set");
            return false;
        };
        match expected {
            Some(expected) => compare(
                actual,
                operator.unwrap_or(&Operator::Equals),
                expected,
                case_sensitive,
            )
            .unwrap_or(false),
            None => true,
        }
    }

    fn evaluate_external(
        &self,
        path: &str,
        name: Option<&str>,
        operator: Option<&Operator>,
        expected: Option<&str>,
        case_sensitive: bool,
    ) -> bool {
        let Some(source) = self.scripts.external_source() else {
            tracing::debug!(path, "No external value source configured");
            return false;
        };
        let actual = match source.read(path, name) {
            Ok(Some(actual)) => actual,
            Ok(None) => {
                tracing::debug!(path, name, "External value not present");
                return false;
            }
            Err(e) => {
                tracing::debug!(path, name, error = %e, "Failed to read external value");
                return false;
            }
        };
        match expected {
            Some(expected) => compare(
                &actual,
                operator.unwrap_or(&Operator::Equals),
                expected,
                case_sensitive,
            )
            .unwrap_or(false),
            None => true,
        }
    }

    /// Run a registered predicate and compare its result with `expected`
    ///
    /// `expected` defaults to `true`.
    pub fn evaluate_script(
        &self,
        script: &str,
        expected: Option<&Value>,
        operator: Option<&Operator>,
        case_sensitive: bool,
    ) -> bool {
        let Some(predicate) = self.scripts.predicate(script) else {
            tracing::warn!(script, "Script is not registered, treating as no match");
            return false;
        };
        let result = match predicate.evaluate(self.context) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(script, error = %e, "Script failed, treating as no match");
                return false;
            }
        };
        let expected = expected.cloned().unwrap_or(Value::Bool(true));
        compare(
            &value_text(&result),
            operator.unwrap_or(&Operator::Equals),
            &value_text(&expected),
            case_sensitive,
        )
        .unwrap_or(false)
    }

    /// Compare a hardware/software fact with `expected`
    ///
    /// Facts that were not collected never match.
    pub fn evaluate_fact(
        &self,
        fact: &str,
        operator: Option<&Operator>,
        expected: Option<&str>,
        case_sensitive: bool,
    ) -> bool {
        let Some(actual) = self.context.fact(fact) else {
            tracing::debug!(fact, "Fact not available");
            return false;
        };
        match expected {
            Some(expected) => compare(
                actual,
                operator.unwrap_or(&Operator::Equals),
                expected,
                case_sensitive,
            )
            .unwrap_or(false),
            None => true,
        }
    }
}

fn missing_field(selector: &MachineSelector, field: &str) -> bool {
    tracing::warn!(
        selector_type = %selector.selector_type,
        field,
        "Selector is missing a required field, treating as no match"
    );
    false
}

/// Textual form of a script result for comparison
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn wildcard_match(actual: &str, pattern: &str, case_sensitive: bool) -> bool {
    match Pattern::new(pattern) {
        Ok(pattern) => pattern.matches_with(
            actual,
            MatchOptions {
                case_sensitive,
                require_literal_separator: false,
                require_literal_leading_dot: false,
            },
        ),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Invalid hostname pattern");
            false
        }
    }
}

/// Apply `operator` to `actual` and `expected`
///
/// Returns `None` when the comparison cannot be made (unknown operator or an
/// invalid regular expression); callers treat that as a non-match.
pub(crate) fn compare(
    actual: &str,
    operator: &Operator,
    expected: &str,
    case_sensitive: bool,
) -> Option<bool> {
    let fold = |s: &str| {
        if case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };

    match operator {
        Operator::Equals => Some(fold(actual) == fold(expected)),
        Operator::NotEquals => Some(fold(actual) != fold(expected)),
        Operator::Contains => Some(fold(actual).contains(&fold(expected))),
        Operator::Matches => match RegexBuilder::new(expected)
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(re) => Some(re.is_match(actual)),
            Err(e) => {
                tracing::warn!(pattern = expected, error = %e, "Invalid regular expression");
                None
            }
        },
        Operator::GreaterThan => Some(ordering(actual, expected, case_sensitive) == Ordering::Greater),
        Operator::LessThan => Some(ordering(actual, expected, case_sensitive) == Ordering::Less),
        Operator::Unrecognized(raw) => {
            tracing::warn!(operator = %raw, "Unknown comparison operator, treating as no match");
            None
        }
    }
}

/// Numeric ordering when both sides parse as numbers, else textual
fn ordering(actual: &str, expected: &str, case_sensitive: bool) -> Ordering {
    match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ if case_sensitive => actual.cmp(expected),
        _ => actual.to_lowercase().cmp(&expected.to_lowercase()),
    }
}

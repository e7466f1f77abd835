//! Textual enumerations used throughout layered documents
//!
//! Every enum here accepts any string on deserialization. Values outside the
//! recognized set are kept as `Unrecognized(raw)` so the resolver can decide
//! how to treat them (warn, skip, or fail) instead of rejecting the whole
//! document at parse time.
//!
//! Parsing is case-insensitive and treats `-` and `_` alike.

macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $text:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
            /// Value outside the recognized set, kept verbatim
            Unrecognized(String),
        }

        impl $name {
            /// Canonical textual form (or the raw text when unrecognized)
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $text, )+
                    Self::Unrecognized(raw) => raw.as_str(),
                }
            }

            pub fn is_recognized(&self) -> bool {
                !matches!(self, Self::Unrecognized(_))
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
                match normalized.as_str() {
                    $( $text $(| $alias)* => Self::$variant, )+
                    _ => Self::Unrecognized(raw.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::from(raw.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

open_enum! {
    /// Which layer contributed an item to the resolved document
    pub enum InheritanceSource {
        Base => "base",
        Shared => "shared" | "common",
        MachineSpecific => "machine_specific" | "machine",
        Conditional => "conditional",
    }
}

impl InheritanceSource {
    /// Priority assigned to items from this source when none is set
    pub fn default_priority(&self) -> Option<i64> {
        match self {
            Self::Base => Some(30),
            Self::Shared => Some(50),
            Self::MachineSpecific => Some(80),
            Self::Conditional => Some(70),
            Self::Unrecognized(_) => None,
        }
    }
}

open_enum! {
    /// Per-item policy for picking a winner between two layers
    pub enum ConflictPolicy {
        MachineWins => "machine_wins",
        SharedWins => "shared_wins",
        MergeBoth => "merge_both",
        Priority => "priority" | "default" | "priority_default",
    }
}

open_enum! {
    /// Kind of predicate a machine selector evaluates
    pub enum SelectorType {
        MachineName => "machine_name",
        HostnamePattern => "hostname_pattern",
        EnvironmentVariable => "environment_variable",
        ExternalValue => "external_value" | "registry_value",
        Script => "script",
    }
}

open_enum! {
    /// Comparison operator for selectors and predicates
    pub enum Operator {
        Equals => "equals" | "eq",
        NotEquals => "not_equals" | "ne",
        Contains => "contains",
        Matches => "matches",
        GreaterThan => "greater_than" | "gt",
        LessThan => "less_than" | "lt",
    }
}

open_enum! {
    /// How a machine-specific layer is folded into the resolved document
    pub enum MergeStrategy {
        Replace => "replace" | "override",
        ShallowMerge => "shallow_merge" | "shallow" | "append",
        DeepMerge => "deep_merge" | "deep" | "merge",
    }
}

impl Default for MergeStrategy {
    fn default() -> Self {
        Self::DeepMerge
    }
}

open_enum! {
    /// What an inheritance rule does to its matching items
    pub enum RuleAction {
        Merge => "merge",
        Replace => "replace",
        Transform => "transform",
        Validate => "validate",
    }
}

open_enum! {
    /// Boolean combination of conditional-section predicates
    pub enum ConditionLogic {
        And => "and" | "all",
        Or => "or" | "any",
        Not => "not" | "none",
    }
}

impl Default for ConditionLogic {
    fn default() -> Self {
        Self::And
    }
}

open_enum! {
    /// Type of a conditional-section predicate
    pub enum ConditionType {
        CustomScript => "custom_script" | "script",
        HardwareCheck => "hardware_check",
        EnvironmentVariable => "environment_variable",
        MachineSelector => "machine_selector",
    }
}

open_enum! {
    /// Strictness of resolved-document validation
    pub enum ValidationLevel {
        Strict => "strict",
        Moderate => "moderate",
        Relaxed => "relaxed",
    }
}

impl Default for ValidationLevel {
    fn default() -> Self {
        Self::Moderate
    }
}

open_enum! {
    /// What to keep when no machine-specific layer applies
    pub enum FallbackStrategy {
        UseShared => "use_shared",
        UseBase => "use_base",
    }
}

impl Default for FallbackStrategy {
    fn default() -> Self {
        Self::UseShared
    }
}

open_enum! {
    /// Name of one of the five document sections
    pub enum SectionKind {
        Files => "files",
        Registry => "registry",
        Applications => "applications",
        Prerequisites => "prerequisites",
        Stages => "stages",
    }
}

impl SectionKind {
    /// All recognized sections in document order
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Files,
        SectionKind::Registry,
        SectionKind::Applications,
        SectionKind::Prerequisites,
        SectionKind::Stages,
    ];
}

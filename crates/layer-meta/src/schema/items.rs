//! Configuration item kinds
//!
//! Each document section holds items of a single kind. All kinds embed the
//! same [`InheritanceMetadata`] and expose a common surface through
//! [`SectionItem`], which lets the resolver stay generic over sections while
//! keeping per-kind fields typed.
//!
//! # Example YAML
//!
//! ```yaml
//! files:
//!   - name: Git config
//!     path: ~/.gitconfig
//!     action: backup
//!     dynamic_state_path: files/gitconfig
//!     inheritance_tags: [dev]
//! registry:
//!   - name: Explorer hidden files
//!     path: HKCU\Software\Microsoft\Windows\CurrentVersion\Explorer\Advanced
//!     key_name: Hidden
//!     action: sync
//!     dynamic_state_path: registry/explorer_hidden.json
//! ```

use super::document::ConfigurationSections;
use super::inheritance::InheritanceMetadata;
use crate::enums::SectionKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A file or directory to capture/restore
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileItem {
    #[serde(default)]
    pub name: String,

    /// Target path on the machine
    #[serde(default)]
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// "file" or "directory"
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,

    /// Location of the captured state inside the backup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_state_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub inheritance: InheritanceMetadata,
}

/// A registry-equivalent key or value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryItem {
    #[serde(default)]
    pub name: String,

    /// Key path
    #[serde(default)]
    pub path: String,

    /// Value name under the key; absent means the whole key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_state_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub inheritance: InheritanceMetadata,
}

/// An installed application tracked through a package manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationItem {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub package_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_state_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub inheritance: InheritanceMetadata,
}

/// A check that must hold before backup/restore runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrerequisiteItem {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub check_command: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub prerequisite_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result: Option<String>,

    /// "warn", "fail" or "skip"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_missing: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub inheritance: InheritanceMetadata,
}

/// A lifecycle hook run around backup/restore
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageItem {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub script_path: String,

    /// e.g. "pre_backup", "post_restore", "cleanup"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub inheritance: InheritanceMetadata,
}

impl RegistryItem {
    fn target_key(&self) -> Cow<'_, str> {
        match self.key_name.as_deref() {
            Some(key) if !key.is_empty() => Cow::Owned(format!("{}\\{}", self.path, key)),
            _ => Cow::Borrowed(&self.path),
        }
    }
}

impl FileItem {
    fn target_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.path)
    }
}

impl ApplicationItem {
    fn target_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.package_id)
    }
}

impl PrerequisiteItem {
    fn target_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.check_command)
    }
}

impl StageItem {
    fn target_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.script_path)
    }
}

/// Any configuration item, tagged by kind
///
/// This is the form handed to user scripts so one transform or validator can
/// serve every section.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationItem {
    File(FileItem),
    Registry(RegistryItem),
    Application(ApplicationItem),
    Prerequisite(PrerequisiteItem),
    Stage(StageItem),
}

impl ConfigurationItem {
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::File(_) => SectionKind::Files,
            Self::Registry(_) => SectionKind::Registry,
            Self::Application(_) => SectionKind::Applications,
            Self::Prerequisite(_) => SectionKind::Prerequisites,
            Self::Stage(_) => SectionKind::Stages,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(item) => item.name(),
            Self::Registry(item) => item.name(),
            Self::Application(item) => item.name(),
            Self::Prerequisite(item) => item.name(),
            Self::Stage(item) => item.name(),
        }
    }

    pub fn target(&self) -> Cow<'_, str> {
        match self {
            Self::File(item) => item.target(),
            Self::Registry(item) => item.target(),
            Self::Application(item) => item.target(),
            Self::Prerequisite(item) => item.target(),
            Self::Stage(item) => item.target(),
        }
    }

    pub fn inheritance(&self) -> &InheritanceMetadata {
        match self {
            Self::File(item) => item.inheritance(),
            Self::Registry(item) => item.inheritance(),
            Self::Application(item) => item.inheritance(),
            Self::Prerequisite(item) => item.inheritance(),
            Self::Stage(item) => item.inheritance(),
        }
    }

    pub fn inheritance_mut(&mut self) -> &mut InheritanceMetadata {
        match self {
            Self::File(item) => item.inheritance_mut(),
            Self::Registry(item) => item.inheritance_mut(),
            Self::Application(item) => item.inheritance_mut(),
            Self::Prerequisite(item) => item.inheritance_mut(),
            Self::Stage(item) => item.inheritance_mut(),
        }
    }
}

/// Common surface of every item kind
pub trait SectionItem:
    Clone + std::fmt::Debug + PartialEq + Serialize + DeserializeOwned
{
    /// Section this kind lives in
    const KIND: SectionKind;

    /// Serialized field holding the item's target
    const TARGET_FIELD: &'static str;

    fn name(&self) -> &str;

    /// Key identifying what the item acts on (path, key, package, ...)
    fn target(&self) -> Cow<'_, str>;

    fn action(&self) -> Option<&str>;

    fn inheritance(&self) -> &InheritanceMetadata;

    fn inheritance_mut(&mut self) -> &mut InheritanceMetadata;

    /// Serialized field names strict validation requires
    fn required_fields() -> &'static [&'static str];

    fn into_item(self) -> ConfigurationItem;

    /// Unwrap a tagged item, returning `None` when it is another kind
    fn from_item(item: ConfigurationItem) -> Option<Self>;

    fn section(sections: &ConfigurationSections) -> &Vec<Self>;

    fn section_mut(sections: &mut ConfigurationSections) -> &mut Vec<Self>;
}

macro_rules! section_item {
    ($ty:ident, $kind:ident, $variant:ident, $field:ident, $target:literal, [$($required:literal),+ $(,)?]) => {
        impl SectionItem for $ty {
            const KIND: SectionKind = SectionKind::$kind;
            const TARGET_FIELD: &'static str = $target;

            fn name(&self) -> &str {
                &self.name
            }

            fn target(&self) -> Cow<'_, str> {
                self.target_key()
            }

            fn action(&self) -> Option<&str> {
                self.action.as_deref()
            }

            fn inheritance(&self) -> &InheritanceMetadata {
                &self.inheritance
            }

            fn inheritance_mut(&mut self) -> &mut InheritanceMetadata {
                &mut self.inheritance
            }

            fn required_fields() -> &'static [&'static str] {
                &[$($required),+]
            }

            fn into_item(self) -> ConfigurationItem {
                ConfigurationItem::$variant(self)
            }

            fn from_item(item: ConfigurationItem) -> Option<Self> {
                match item {
                    ConfigurationItem::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn section(sections: &ConfigurationSections) -> &Vec<Self> {
                &sections.$field
            }

            fn section_mut(sections: &mut ConfigurationSections) -> &mut Vec<Self> {
                &mut sections.$field
            }
        }
    };
}

section_item!(
    FileItem,
    Files,
    File,
    files,
    "path",
    ["name", "path", "action", "dynamic_state_path"]
);
section_item!(
    RegistryItem,
    Registry,
    Registry,
    registry,
    "path",
    ["name", "path", "action", "dynamic_state_path"]
);
section_item!(
    ApplicationItem,
    Applications,
    Application,
    applications,
    "package_id",
    ["name", "package_id"]
);
section_item!(
    PrerequisiteItem,
    Prerequisites,
    Prerequisite,
    prerequisites,
    "check_command",
    ["name", "check_command"]
);
section_item!(StageItem, Stages, Stage, stages, "script_path", ["name", "script_path"]);

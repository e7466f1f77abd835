//! Terse item constructors

use layer_meta::{
    ApplicationItem, FileItem, InheritanceSource, PrerequisiteItem, RegistryItem, SectionItem,
    StageItem,
};

pub fn file(name: &str, path: &str) -> FileItem {
    FileItem {
        name: name.to_string(),
        path: path.to_string(),
        ..Default::default()
    }
}

/// A file item carrying every field strict validation requires
pub fn complete_file(name: &str, path: &str) -> FileItem {
    FileItem {
        action: Some("backup".to_string()),
        dynamic_state_path: Some(format!("files/{}", slug(name))),
        ..file(name, path)
    }
}

pub fn registry(name: &str, path: &str, key_name: Option<&str>) -> RegistryItem {
    RegistryItem {
        name: name.to_string(),
        path: path.to_string(),
        key_name: key_name.map(str::to_string),
        action: Some("sync".to_string()),
        dynamic_state_path: Some(format!("registry/{}.json", slug(name))),
        ..Default::default()
    }
}

pub fn application(name: &str, package_id: &str) -> ApplicationItem {
    ApplicationItem {
        name: name.to_string(),
        package_id: package_id.to_string(),
        ..Default::default()
    }
}

pub fn prerequisite(name: &str, check_command: &str) -> PrerequisiteItem {
    PrerequisiteItem {
        name: name.to_string(),
        check_command: check_command.to_string(),
        ..Default::default()
    }
}

pub fn stage(name: &str, script_path: &str) -> StageItem {
    StageItem {
        name: name.to_string(),
        script_path: script_path.to_string(),
        ..Default::default()
    }
}

/// Add inheritance tags to any item
pub fn tagged<T: SectionItem>(mut item: T, tags: &[&str]) -> T {
    for tag in tags {
        item.inheritance_mut().add_tag(*tag);
    }
    item
}

/// Stamp an item as if a layer had contributed it
pub fn from_source<T: SectionItem>(mut item: T, source: InheritanceSource, priority: i64) -> T {
    item.inheritance_mut().stamp(source, priority);
    item
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

//! Field-level access to typed items through their serialized form
//!
//! Items are plain structs, but conflict resolution and inheritance rules
//! address fields by name (`merge_both` overlays, `replace` rules,
//! `required_properties`). These helpers go through the item's JSON object
//! so every kind gets the same behaviour without per-kind field tables.

use crate::error::{Error, Result};
use crate::schema::{INHERITANCE_FIELDS, SectionItem};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Serialize an item into its JSON object
pub fn to_object<T: SectionItem>(item: &T) -> Result<Map<String, Value>> {
    let value = serde_json::to_value(item).map_err(|source| Error::Conversion {
        kind: T::KIND.to_string(),
        item: item.name().to_string(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::NotAnObject {
            kind: T::KIND.to_string(),
            item: item.name().to_string(),
        }),
    }
}

fn from_object<T: SectionItem>(name: &str, object: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(object)).map_err(|source| Error::Conversion {
        kind: T::KIND.to_string(),
        item: name.to_string(),
        source,
    })
}

/// Copy of `base` with every non-inheritance field set on `overlay` laid on top
///
/// Fields that `overlay` leaves unset (null, blank strings, empty
/// collections) keep their `base` value. Inheritance metadata always comes
/// from `base`.
pub fn overlay<T: SectionItem>(base: &T, overlay: &T) -> Result<T> {
    let mut merged = to_object(base)?;
    for (key, value) in to_object(overlay)? {
        if is_unset(&value) || INHERITANCE_FIELDS.contains(&key.as_str()) {
            continue;
        }
        merged.insert(key, value);
    }
    from_object(base.name(), merged)
}

/// Copy of `item` with the named fields overwritten
///
/// Fields are applied one at a time so a value that does not fit its field,
/// or a name the item kind does not have, is reported by name.
pub fn with_fields<T: SectionItem>(item: &T, values: &BTreeMap<String, Value>) -> Result<T> {
    let invalid = |field: &str, message: String| Error::InvalidField {
        kind: T::KIND.to_string(),
        item: item.name().to_string(),
        field: field.to_string(),
        message,
    };

    let mut object = to_object(item)?;
    for (field, value) in values {
        object.insert(field.clone(), value.clone());
        let parsed: T = serde_json::from_value(Value::Object(object.clone()))
            .map_err(|e| invalid(field, e.to_string()))?;

        // Unknown keys are dropped on the way back in
        if !is_unset(value) && !to_object(&parsed)?.contains_key(field.as_str()) {
            return Err(invalid(field, format!("{} items have no such field", T::KIND)));
        }
    }
    from_object(item.name(), object)
}

/// Whether `item` carries a non-empty value for `field`
///
/// Null, empty strings, and empty arrays/objects count as missing.
pub fn has_property<T: SectionItem>(item: &T, field: &str) -> Result<bool> {
    let object = to_object(item)?;
    Ok(object.get(field).is_some_and(|value| !is_unset(value)))
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

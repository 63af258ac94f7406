//! Schema conversion
//!
//! Validates and coerces request values field by field into the target
//! document. Only fields present in the given schema subset are touched;
//! with `full` set (PUT semantics) absent fields are reset to their empty
//! value instead of being skipped.

use corpus_core::{CorpusResult, Document, Error, FieldDescriptor, FieldKind};
use serde_json::{Map, Value};

pub fn convert(
    schema: &[FieldDescriptor],
    source: &Map<String, Value>,
    target: &mut Document,
    full: bool,
) -> CorpusResult<()> {
    for field in schema {
        let (store_as, incoming) = match &field.kind {
            // Joins convert through the shadow identifier field; the
            // virtual field is render-time output, never stored.
            FieldKind::Join { ids_field } => (
                ids_field.as_str(),
                source.get(ids_field.as_str()).or_else(|| source.get(&field.name)),
            ),
            _ => (field.name.as_str(), source.get(&field.name)),
        };

        match incoming {
            Some(value) => {
                let converted = coerce(&field.kind, value)?;
                target.insert(store_as.to_string(), converted);
            }
            None if full => {
                target.insert(store_as.to_string(), empty_value(&field.kind));
            }
            None => {}
        }
    }
    Ok(())
}

fn coerce(kind: &FieldKind, value: &Value) -> CorpusResult<Value> {
    let converted = match kind {
        FieldKind::String => Value::String(value.as_str().ok_or_else(Error::invalid)?.to_string()),
        FieldKind::Boolean => Value::Bool(launder_boolean(value)?),
        FieldKind::Integer => match value {
            Value::Number(n) if n.is_i64() => value.clone(),
            Value::String(s) => Value::from(s.parse::<i64>().map_err(|_| Error::invalid())?),
            _ => return Err(Error::invalid()),
        },
        FieldKind::Float => match value {
            Value::Number(_) => value.clone(),
            Value::String(s) => Value::from(s.parse::<f64>().map_err(|_| Error::invalid())?),
            _ => return Err(Error::invalid()),
        },
        FieldKind::Tags => {
            let items = value.as_array().ok_or_else(Error::invalid)?;
            let tags: Vec<Value> = items
                .iter()
                .filter(|item| item.is_string())
                .cloned()
                .collect();
            Value::Array(tags)
        }
        FieldKind::Object => {
            if !value.is_object() {
                return Err(Error::invalid());
            }
            value.clone()
        }
        FieldKind::ObjectArray => {
            let items = value.as_array().ok_or_else(Error::invalid)?;
            if items.iter().any(|item| !item.is_object()) {
                return Err(Error::invalid());
            }
            value.clone()
        }
        FieldKind::Attachment => match value {
            Value::Null => Value::Null,
            Value::Object(descriptor) if descriptor.contains_key("_id") => value.clone(),
            _ => return Err(Error::invalid()),
        },
        FieldKind::Select { choices } => {
            let choice = value.as_str().ok_or_else(Error::invalid)?;
            if !choices.iter().any(|c| c == choice) {
                return Err(Error::invalid());
            }
            value.clone()
        }
        FieldKind::Join { .. } => {
            // Shadow field value: a list of referenced document ids.
            let ids = value.as_array().ok_or_else(Error::invalid)?;
            if ids.iter().any(|id| !id.is_string()) {
                return Err(Error::invalid());
            }
            value.clone()
        }
    };
    Ok(converted)
}

fn empty_value(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::String | FieldKind::Select { .. } => Value::String(String::new()),
        FieldKind::Boolean => Value::Bool(false),
        FieldKind::Integer => Value::from(0),
        FieldKind::Float => Value::from(0.0),
        FieldKind::Tags | FieldKind::ObjectArray | FieldKind::Join { .. } => {
            Value::Array(Vec::new())
        }
        FieldKind::Object => Value::Object(Map::new()),
        FieldKind::Attachment => Value::Null,
    }
}

/// Form-tolerant boolean: accepts real booleans and their common string
/// renditions.
pub fn launder_boolean(value: &Value) -> CorpusResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            _ => Err(Error::invalid()),
        },
        _ => Err(Error::invalid()),
    }
}

/// Derive a URL-safe slug from a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

//! The path navigator (§4.3): walks a [`serde_yaml::Value`] snapshot of a
//! loaded document by a dotted path, e.g. `.inputs.message.type` or
//! `.inputs.0.type` — list and key lookups are interchangeable at every
//! segment (§6 example: `.inputs.input.label` and `.inputs.0.label` resolve
//! to the same node).
//!
//! Operating on the generic value snapshot rather than one walker function
//! per Rust struct keeps this module flat: `CWLDocument` already round-trips
//! through [`serde_yaml::Value`] for [`crate::clt::CommandLineTool`]'s
//! `Display` impl, so reusing that representation here avoids a second,
//! parallel traversal API per type.

use serde_yaml::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum NavigationError {
    #[error("invalid path syntax at '{0}'")]
    InvalidSyntax(String),

    #[error("'{field}' has no such field, at path '{path}'")]
    NoSuchField { field: String, path: String },

    #[error("index {index} out of bounds (len {len}), at path '{path}'")]
    IndexOutOfBounds { index: usize, len: usize, path: String },

    #[error("'{path}' does not resolve to a sequence or mapping, cannot list keys")]
    NotIterable { path: String },
}

/// The fields a list element may be keyed by, tried in this order: `id` for
/// parameters/steps, `class` for requirements, `package` for software
/// packages (§4.3).
const KEY_FIELDS: &[&str] = &["id", "class", "package"];

fn parse_path(path: &str) -> Vec<String> {
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        return Vec::new();
    }
    path.split('.').map(str::to_string).collect()
}

fn key_of(item: &Value) -> Option<&str> {
    KEY_FIELDS.iter().find_map(|field| item.get(field).and_then(Value::as_str))
}

/// Resolves one path segment against a sequence: a segment that parses as a
/// decimal index is tried first, then each element's key field.
fn index_sequence<'a>(seq: &'a [Value], segment: &str, traversed: &str) -> Result<&'a Value, NavigationError> {
    if let Ok(index) = segment.parse::<usize>() {
        return seq.get(index).ok_or_else(|| NavigationError::IndexOutOfBounds { index, len: seq.len(), path: traversed.to_string() });
    }
    seq.iter()
        .find(|item| key_of(item) == Some(segment))
        .ok_or_else(|| NavigationError::NoSuchField { field: segment.to_string(), path: traversed.to_string() })
}

/// Resolves `path` against `root`, returning the matched sub-tree.
pub fn get<'a>(root: &'a Value, path: &str) -> Result<&'a Value, NavigationError> {
    let segments = parse_path(path);
    let mut current = root;
    let mut traversed = String::new();

    for segment in segments {
        if segment.is_empty() {
            return Err(NavigationError::InvalidSyntax(path.to_string()));
        }
        traversed.push('.');
        traversed.push_str(&segment);
        current = match current {
            Value::Sequence(seq) => index_sequence(seq, &segment, &traversed)?,
            _ => current
                .get(&segment)
                .ok_or_else(|| NavigationError::NoSuchField { field: segment.clone(), path: traversed.clone() })?,
        };
    }
    Ok(current)
}

/// Lists the immediate children of the value at `path`: field names for a
/// mapping, numeric indices (as strings) for a sequence.
pub fn keys(root: &Value, path: &str) -> Result<Vec<String>, NavigationError> {
    let value = get(root, path)?;
    match value {
        Value::Mapping(map) => Ok(map.keys().filter_map(|k| k.as_str().map(str::to_string)).collect()),
        Value::Sequence(seq) => Ok((0..seq.len()).map(|i| i.to_string()).collect()),
        _ => Err(NavigationError::NotIterable { path: path.to_string() }),
    }
}

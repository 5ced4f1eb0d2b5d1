//! The input coercer (§4.5): resolves a job's raw values against a
//! document's declared types, trying each `Union` alternative in turn,
//! evaluating `File`/`Directory` parameters against the document's
//! directory, and honoring `loadContents`.

use crate::InspectionError;
use commonwl::inputs::CommandInputParameter;
use commonwl::types::{CWLType, DefaultValue, UninstantiatedVar};
use std::collections::HashMap;
use std::path::Path;

/// Resolves every `declared` parameter against `job_values`, per §4.5. A
/// required parameter with no job value and no default does not fail here:
/// it resolves to an Uninstantiated sentinel that later rendering and
/// expression evaluation recognize on their own terms.

pub fn coerce_inputs(declared: &[CommandInputParameter], job_values: &HashMap<String, DefaultValue>, doc_dir: &Path) -> Result<HashMap<String, DefaultValue>, InspectionError> {
    let mut resolved = HashMap::new();
    for input in declared {
        let raw = match job_values.get(&input.id) {
            Some(value) => value.clone(),
            None => match &input.default {
                Some(default) => default.clone(),
                None if input.type_.is_optional() => {
                    resolved.insert(input.id.clone(), DefaultValue::Any(serde_yaml::Value::Null));
                    continue;
                }
                None => DefaultValue::Uninstantiated(UninstantiatedVar(input.id.clone())),
            },
        };
        let load_contents = input.load_contents || input.input_binding.as_ref().is_some_and(|b| b.load_contents);
        let coerced = coerce_value(&raw, &input.type_, doc_dir, load_contents).map_err(|reasons| {
            if reasons.len() > 1 {
                InspectionError::NoUnionAlternative { reasons: reasons.join("; ") }
            } else {
                InspectionError::TypeMismatch { id: input.id.clone() }
            }
        })?;
        resolved.insert(input.id.clone(), coerced);
    }
    Ok(resolved)
}

/// Coerces a single raw value against a single type, recursing into
/// `Optional`/`Array`/`Union`/`Record`. Returns the list of per-alternative
/// failure reasons on a `Union` that matches nothing, so callers can report
/// why each branch was rejected.
fn coerce_value(value: &DefaultValue, cwl_type: &CWLType, doc_dir: &Path, load_contents: bool) -> Result<DefaultValue, Vec<String>> {
    if value.is_uninstantiated() {
        return Ok(value.clone());
    }
    match cwl_type {
        CWLType::Null if matches!(value, DefaultValue::Any(serde_yaml::Value::Null)) => Ok(value.clone()),
        CWLType::Optional(inner) => {
            if matches!(value, DefaultValue::Any(serde_yaml::Value::Null)) {
                Ok(DefaultValue::Any(serde_yaml::Value::Null))
            } else {
                coerce_value(value, inner, doc_dir, load_contents)
            }
        }
        CWLType::File if value.has_matching_type(&CWLType::File) => match value {
            DefaultValue::File(file) => Ok(DefaultValue::File(file.evaluate(doc_dir, load_contents))),
            _ => Err(vec!["expected a File value".to_string()]),
        },
        CWLType::Directory if value.has_matching_type(&CWLType::Directory) => match value {
            DefaultValue::Directory(dir) => Ok(DefaultValue::Directory(dir.evaluate(doc_dir))),
            _ => Err(vec!["expected a Directory value".to_string()]),
        },
        CWLType::Array(inner) => match value {
            DefaultValue::Array(items) => {
                let coerced = items.iter().map(|item| coerce_value(item, inner, doc_dir, load_contents)).collect::<Result<Vec<_>, _>>()?;
                Ok(DefaultValue::Array(coerced))
            }
            _ => Err(vec!["expected an array value".to_string()]),
        },
        CWLType::Record(schema) => match value {
            DefaultValue::Record(fields) => {
                let mut out = Vec::new();
                for field in &schema.fields {
                    let Some((_, field_value)) = fields.iter().find(|(name, _)| name == &field.name) else {
                        return Err(vec![format!("record is missing field '{}'", field.name)]);
                    };
                    out.push((field.name.clone(), coerce_value(field_value, &field.type_, doc_dir, load_contents)?));
                }
                Ok(DefaultValue::Record(out))
            }
            _ => Err(vec!["expected a record value".to_string()]),
        },
        CWLType::Enum(schema) => match value {
            DefaultValue::Any(serde_yaml::Value::String(s)) if schema.symbols.contains(s) => Ok(value.clone()),
            DefaultValue::Any(serde_yaml::Value::String(s)) => Err(vec![format!("'{s}' is not one of the enum's symbols")]),
            _ => Err(vec!["expected a string matching one of the enum's symbols".to_string()]),
        },
        CWLType::Union(alternatives) => {
            let mut reasons = Vec::new();
            for alt in alternatives {
                match coerce_value(value, alt, doc_dir, load_contents) {
                    Ok(coerced) => return Ok(coerced),
                    Err(reason) => reasons.extend(reason),
                }
            }
            Err(reasons)
        }
        CWLType::Any => Ok(value.clone()),
        other => {
            if value.has_matching_type(other) {
                Ok(value.clone())
            } else {
                Err(vec![format!("value does not match declared type {other:?}")])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonwl::types::File;
    use serde_yaml::Value;
    use std::path::PathBuf;

    fn doc_dir() -> PathBuf {
        PathBuf::from(".")
    }

    #[test]
    fn test_coerce_scalar() {
        let declared = vec![CommandInputParameter::default().with_id("x").with_type(CWLType::Int)];
        let mut job = HashMap::new();
        job.insert("x".to_string(), DefaultValue::Any(Value::Number(5.into())));
        let resolved = coerce_inputs(&declared, &job, &doc_dir()).unwrap();
        assert_eq!(resolved.get("x").unwrap(), &DefaultValue::Any(Value::Number(5.into())));
    }

    #[test]
    fn test_coerce_union_picks_matching_alternative() {
        let declared = vec![CommandInputParameter::default().with_id("x").with_type(CWLType::Union(vec![CWLType::Int, CWLType::String]))];
        let mut job = HashMap::new();
        job.insert("x".to_string(), DefaultValue::Any(Value::String("hi".to_string())));
        let resolved = coerce_inputs(&declared, &job, &doc_dir()).unwrap();
        assert_eq!(resolved.get("x").unwrap(), &DefaultValue::Any(Value::String("hi".to_string())));
    }

    #[test]
    fn test_coerce_union_no_alternative_matches() {
        let declared = vec![CommandInputParameter::default().with_id("x").with_type(CWLType::Union(vec![CWLType::Int, CWLType::Boolean]))];
        let mut job = HashMap::new();
        job.insert("x".to_string(), DefaultValue::Any(Value::String("hi".to_string())));
        let err = coerce_inputs(&declared, &job, &doc_dir()).unwrap_err();
        assert!(matches!(err, InspectionError::NoUnionAlternative { .. }));
    }

    #[test]
    fn test_coerce_file_evaluates_location() {
        let declared = vec![CommandInputParameter::default().with_id("f").with_type(CWLType::File)];
        let mut job = HashMap::new();
        job.insert("f".to_string(), DefaultValue::File(File::from_location(&"input.txt".to_string())));
        let resolved = coerce_inputs(&declared, &job, &doc_dir()).unwrap();
        let DefaultValue::File(file) = resolved.get("f").unwrap() else { panic!("expected file") };
        assert_eq!(file.basename.as_deref(), Some("input.txt"));
    }

    #[test]
    fn test_coerce_optional_missing_is_null() {
        let declared = vec![CommandInputParameter::default().with_id("x").with_type(CWLType::Optional(Box::new(CWLType::String)))];
        let resolved = coerce_inputs(&declared, &HashMap::new(), &doc_dir()).unwrap();
        assert_eq!(resolved.get("x").unwrap(), &DefaultValue::Any(Value::Null));
    }

    #[test]
    fn test_coerce_required_missing_is_uninstantiated() {
        let declared = vec![CommandInputParameter::default().with_id("message").with_type(CWLType::String)];
        let resolved = coerce_inputs(&declared, &HashMap::new(), &doc_dir()).unwrap();
        let value = resolved.get("message").unwrap();
        assert!(value.is_uninstantiated());
        assert_eq!(value.uninstantiated_id(), Some("message"));
    }

    #[test]
    fn test_coerce_required_missing_file_is_uninstantiated_not_error() {
        let declared = vec![CommandInputParameter::default().with_id("src").with_type(CWLType::File)];
        let resolved = coerce_inputs(&declared, &HashMap::new(), &doc_dir()).unwrap();
        assert!(resolved.get("src").unwrap().is_uninstantiated());
    }
}

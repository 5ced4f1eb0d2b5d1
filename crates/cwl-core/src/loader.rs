//! The document loader (§4.1): reads a CWL file off disk, expands
//! `$import`, validates `cwlVersion`, and resolves every named type against
//! the `SchemaDefRequirement` registry in scope before handing back a typed
//! [`crate::CWLDocument`].

use crate::error::ParseError;
use crate::requirements::{FromRequirement, Requirement, SchemaDefRequirement};
use crate::types::CWLType;
use crate::CWLDocument;
use log::debug;
use serde_yaml::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub fn load_document(path: &Path) -> Result<CWLDocument, ParseError> {
    if !path.exists() {
        return Err(ParseError::NotFound { path: path.to_path_buf() });
    }
    let raw = fs::read_to_string(path).map_err(|e| ParseError::io(path, e))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let doc = load_document_str(&raw, base_dir, path)?;
    debug!("loaded {} from {}", doc.class(), path.display());
    Ok(doc)
}

/// Core of [`load_document`], taking already-read source text and a base
/// directory for resolving relative `$import`s — the path a document came
/// from (a real file, or `-` for stdin) is only used for error messages.
pub fn load_document_str(raw: &str, base_dir: &Path, source: &Path) -> Result<CWLDocument, ParseError> {
    let value: Value = serde_yaml::from_str(raw).map_err(|e| ParseError::yaml(source, e))?;

    let expanded = expand_imports(value, base_dir)?;

    validate_version(&expanded)?;

    let mut doc: CWLDocument = serde_yaml::from_value(expanded.clone()).map_err(|e| ParseError::Yaml { path: source.to_path_buf(), source: e })?;

    let registry = build_registry(&expanded)?;
    if !registry.is_empty() {
        resolve_named_types(&mut doc, &registry)?;
    }

    synthesize_std_filenames(&mut doc);

    Ok(doc)
}

/// Invariant 5 (§3): a `CommandOutputParameter` of type `stdout`/`stderr`
/// forces synthesis of a unique filename on the tool if one wasn't declared.
fn synthesize_std_filenames(doc: &mut CWLDocument) {
    let CWLDocument::CommandLineTool(tool) = doc else { return };
    let has_stdout_output = tool.outputs.iter().any(|o| matches!(o.type_, CWLType::Stdout));
    let has_stderr_output = tool.outputs.iter().any(|o| matches!(o.type_, CWLType::Stderr));
    if has_stdout_output && tool.stdout.is_none() {
        tool.stdout = Some(format!("{}.stdout", tool.base.id.clone().unwrap_or_else(|| "cwl".to_string())));
    }
    if has_stderr_output && tool.stderr.is_none() {
        tool.stderr = Some(format!("{}.stderr", tool.base.id.clone().unwrap_or_else(|| "cwl".to_string())));
    }
}

fn validate_version(value: &Value) -> Result<(), ParseError> {
    let version = value.get("cwlVersion").and_then(Value::as_str).ok_or_else(|| ParseError::MissingField { field: "cwlVersion".to_string() })?;
    if version != "v1.0" {
        return Err(ParseError::UnsupportedVersion { found: version.to_string() });
    }
    Ok(())
}

/// Recursively expands `{"$import": "relative/path"}` mappings, which CWL
/// permits anywhere a value is expected, with imported content re-rooted
/// against the importing file's directory for any imports nested inside it.
fn expand_imports(value: Value, base_dir: &Path) -> Result<Value, ParseError> {
    match value {
        Value::Mapping(ref map) if map.len() == 1 => {
            if let Some(Value::String(import_path)) = map.get(Value::String("$import".to_string())) {
                let resolved_path = base_dir.join(import_path);
                let raw = fs::read_to_string(&resolved_path).map_err(|e| ParseError::io(&resolved_path, e))?;
                let imported: Value = serde_yaml::from_str(&raw).map_err(|e| ParseError::yaml(&resolved_path, e))?;
                let import_dir = resolved_path.parent().unwrap_or(base_dir);
                return expand_imports(imported, import_dir);
            }
            expand_mapping(value, base_dir)
        }
        Value::Mapping(_) => expand_mapping(value, base_dir),
        Value::Sequence(seq) => Ok(Value::Sequence(seq.into_iter().map(|v| expand_imports(v, base_dir)).collect::<Result<_, _>>()?)),
        other => Ok(other),
    }
}

fn expand_mapping(value: Value, base_dir: &Path) -> Result<Value, ParseError> {
    let Value::Mapping(map) = value else { unreachable!() };
    let mut out = serde_yaml::Mapping::new();
    for (k, v) in map {
        out.insert(k, expand_imports(v, base_dir)?);
    }
    Ok(Value::Mapping(out))
}

/// Builds the name → type table from every `SchemaDefRequirement` found in
/// `requirements:` (hints are not eligible: a schema a tool cannot run
/// without belongs in `requirements:`).
fn build_registry(value: &Value) -> Result<HashMap<String, CWLType>, ParseError> {
    let Some(requirements_value) = value.get("requirements") else {
        return Ok(HashMap::new());
    };
    let requirements = crate::requirements::parse_requirements(requirements_value)?;
    let schema_def: Option<&SchemaDefRequirement> = Requirement::get(&requirements);
    Ok(schema_def.map(SchemaDefRequirement::registry).unwrap_or_default())
}

fn resolve_named_types(doc: &mut CWLDocument, registry: &HashMap<String, CWLType>) -> Result<(), ParseError> {
    for input in doc.inputs_mut() {
        resolve_type(input, registry)?;
    }
    for output in doc.output_types_mut() {
        resolve_type(output, registry)?;
    }
    Ok(())
}

fn resolve_type(t: &mut CWLType, registry: &HashMap<String, CWLType>) -> Result<(), ParseError> {
    match t {
        CWLType::Named(name) => {
            let resolved = registry.get(name).cloned().ok_or_else(|| ParseError::UnknownNamedType { name: name.clone() })?;
            *t = resolved;
        }
        CWLType::Optional(inner) | CWLType::Array(inner) => resolve_type(inner, registry)?,
        CWLType::Union(types) => {
            for inner in types {
                resolve_type(inner, registry)?;
            }
        }
        CWLType::Record(schema) => {
            for field in &mut schema.fields {
                resolve_type(&mut field.type_, registry)?;
            }
        }
        _ => {}
    }
    Ok(())
}

//! `requirements:`/`hints:` — the process modifiers attached to a tool,
//! workflow or step. §3 and §4.1 ("SchemaDefRequirement as a real type
//! registry").

use crate::error::ParseError;
use crate::types::{CWLType, Dirent, EnviromentDefs, RecordSchema, EnumSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "class")]
pub enum Requirement {
    InitialWorkDirRequirement(InitialWorkDirRequirement),
    EnvVarRequirement(EnvVarRequirement),
    ShellCommandRequirement(ShellCommandRequirement),
    #[serde(rename = "DockerRequirement")]
    DockerRequirement(DockerRequirement),
    ResourceRequirement(ResourceRequirement),
    #[serde(rename = "InlineJavascriptRequirement")]
    InlineJavascriptRequirement(InlineJavascriptRequirement),
    SchemaDefRequirement(SchemaDefRequirement),
    SoftwareRequirement(SoftwareRequirement),
    SubworkflowFeatureRequirement,
    ScatterFeatureRequirement,
    MultipleInputFeatureRequirement,
    StepInputExpressionRequirement,
    ToolTimeLimit(ToolTimeLimit),
    NetworkAccess(NetworkAccess),
}

/// Mirrors `Requirement`'s construction from any of its payload types, so
/// callers can build a `requirements:` entry without naming the enum
/// variant directly.
pub trait FromRequirement<T> {
    fn get(requirements: &[Requirement]) -> Option<&T>;
}

macro_rules! impl_from_requirement {
    ($variant:ident, $type:ty) => {
        impl FromRequirement<$type> for Requirement {
            fn get(requirements: &[Requirement]) -> Option<&$type> {
                requirements.iter().find_map(|req| match req {
                    Requirement::$variant(inner) => Some(inner),
                    _ => None,
                })
            }
        }
    };
}

impl_from_requirement!(InitialWorkDirRequirement, InitialWorkDirRequirement);
impl_from_requirement!(EnvVarRequirement, EnvVarRequirement);
impl_from_requirement!(DockerRequirement, DockerRequirement);
impl_from_requirement!(ResourceRequirement, ResourceRequirement);
impl_from_requirement!(InlineJavascriptRequirement, InlineJavascriptRequirement);
impl_from_requirement!(SchemaDefRequirement, SchemaDefRequirement);
impl_from_requirement!(ToolTimeLimit, ToolTimeLimit);
impl_from_requirement!(NetworkAccess, NetworkAccess);

impl Requirement {
    pub fn has_shell_command_requirement(requirements: &[Requirement]) -> bool {
        requirements.iter().any(|r| matches!(r, Requirement::ShellCommandRequirement(_)))
    }

    /// Whether `$(...)`/`${...}` bodies may call into a JS engine (§4.4):
    /// gated on `InlineJavascriptRequirement`, unlike bare parameter
    /// references which are always available.
    pub fn has_inline_javascript_requirement(requirements: &[Requirement]) -> bool {
        requirements.iter().any(|r| matches!(r, Requirement::InlineJavascriptRequirement(_)))
    }
}

/// Deserializes a `requirements:`/`hints:` list, which CWL permits either as
/// a sequence of `{class: ..., ...}` objects or as a mapping from class name
/// to its body. Unknown classes are dropped (`hints:` is lenient by
/// definition; §3 requires `requirements:` to use the strict counterpart).
pub fn deserialize_requirements<'de, D>(deserializer: D) -> Result<Vec<Requirement>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_requirements_or_hints(deserializer, true)
}

pub fn deserialize_hints<'de, D>(deserializer: D) -> Result<Vec<Requirement>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_requirements_or_hints(deserializer, false)
}

fn deserialize_requirements_or_hints<'de, D>(deserializer: D, strict: bool) -> Result<Vec<Requirement>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(value) = value else { return Ok(Vec::new()) };

    let entries: Vec<Value> = match value {
        Value::Sequence(seq) => seq,
        Value::Mapping(map) => map
            .into_iter()
            .map(|(class, body)| {
                let mut body = body;
                if let Value::Mapping(ref mut m) = body {
                    m.insert(Value::String("class".to_string()), class);
                } else {
                    let mut m = serde_yaml::Mapping::new();
                    m.insert(Value::String("class".to_string()), class);
                    body = Value::Mapping(m);
                }
                body
            })
            .collect(),
        Value::Null => Vec::new(),
        other => return Err(serde::de::Error::custom(format!("expected a sequence or mapping, found {other:?}"))),
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_yaml::from_value::<Requirement>(entry.clone()) {
            Ok(req) => Some(Ok(req)),
            Err(e) if strict => Some(Err(serde::de::Error::custom(e))),
            Err(_) => None,
        })
        .collect()
}

/// Parses a free-standing `requirements:`/`hints:` list outside of serde's
/// deserialize flow, e.g. when resolving a `SchemaDefRequirement` registry
/// before the rest of a document is known. Unknown classes are a hard
/// [`ParseError`] regardless of `strict`, matching `requirements:`
/// semantics, since a registry lookup with a silently-dropped entry would
/// be worse than a clear failure.
pub fn parse_requirements(value: &Value) -> Result<Vec<Requirement>, ParseError> {
    let Value::Sequence(seq) = value else {
        return Err(ParseError::WrongKind {
            field: "requirements".to_string(),
            expected: "sequence".to_string(),
            found: "non-sequence".to_string(),
        });
    };
    seq.iter()
        .map(|entry| {
            let class = entry.get("class").and_then(Value::as_str).unwrap_or("").to_string();
            serde_yaml::from_value(entry.clone()).map_err(|_| ParseError::UnknownClass {
                class,
                location: "requirements".to_string(),
            })
        })
        .collect()
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct InitialWorkDirRequirement {
    pub listing: Vec<Dirent>,
}

impl InitialWorkDirRequirement {
    pub fn from_file(filename: &str, contents: &str) -> Self {
        Self {
            listing: vec![Dirent {
                entryname: Some(filename.to_string()),
                entry: crate::types::Entry::Source(contents.to_string()),
                writable: false,
            }],
        }
    }

    pub fn from_files(paths: &[&str]) -> Self {
        Self {
            listing: paths
                .iter()
                .map(|path| Dirent {
                    entryname: None,
                    entry: crate::types::Entry::from_file(path),
                    writable: false,
                })
                .collect(),
        }
    }

    pub fn add_files(&mut self, paths: &[&str]) {
        for path in paths {
            self.listing.push(Dirent {
                entryname: None,
                entry: crate::types::Entry::from_file(path),
                writable: false,
            });
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarRequirement {
    pub env_def: EnviromentDefs,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct ShellCommandRequirement {}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DockerRequirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_pull: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_output_directory: Option<String>,
}

impl DockerRequirement {
    pub fn from_pull(image: &str) -> Self {
        Self { docker_pull: Some(image.to_string()), ..Default::default() }
    }

    pub fn from_file(dockerfile: &str) -> Self {
        Self { docker_file: Some(dockerfile.to_string()), ..Default::default() }
    }
}

/// A bound that is either a fixed string (an unresolved expression, carried
/// through verbatim) or a number.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum StringOrNumber {
    String(String),
    Int(i64),
    Float(f64),
}

impl StringOrNumber {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StringOrNumber::Int(i) => Some(*i as f64),
            StringOrNumber::Float(f) => Some(*f),
            StringOrNumber::String(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirement {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores_min: Option<StringOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores_max: Option<StringOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_min: Option<StringOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_max: Option<StringOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmpdir_min: Option<StringOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmpdir_max: Option<StringOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdir_min: Option<StringOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdir_max: Option<StringOrNumber>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct InlineJavascriptRequirement {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expression_lib: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct SoftwareRequirement {
    #[serde(default)]
    pub packages: Vec<SoftwarePackage>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SoftwarePackage {
    pub package: String,
    #[serde(default)]
    pub version: Vec<String>,
    #[serde(default)]
    pub specs: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolTimeLimit {
    pub timelimit: StringOrNumber,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAccess {
    pub network_access: bool,
}

/// A named type, defined once under `SchemaDefRequirement` and referenced
/// elsewhere by name. The loader resolves every [`CWLType::Named`] against
/// this registry before handing a document back to a caller.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct NamedSchema {
    pub name: String,
    #[serde(flatten)]
    pub type_: NamedSchemaType,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NamedSchemaType {
    Record(RecordSchema),
    Enum(EnumSchema),
    Array { items: Box<CWLType> },
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct SchemaDefRequirement {
    pub types: Vec<NamedSchema>,
}

impl SchemaDefRequirement {
    /// Builds the name → type lookup table used by the loader's named-type
    /// resolution pass.
    pub fn registry(&self) -> HashMap<String, CWLType> {
        self.types
            .iter()
            .map(|schema| {
                let resolved = match &schema.type_ {
                    NamedSchemaType::Record(r) => {
                        let mut r = r.clone();
                        r.name.get_or_insert_with(|| schema.name.clone());
                        CWLType::Record(r)
                    }
                    NamedSchemaType::Enum(e) => {
                        let mut e = e.clone();
                        e.name.get_or_insert_with(|| schema.name.clone());
                        CWLType::Enum(e)
                    }
                    NamedSchemaType::Array { items } => CWLType::Array(items.clone()),
                };
                (schema.name.clone(), resolved)
            })
            .collect()
    }
}

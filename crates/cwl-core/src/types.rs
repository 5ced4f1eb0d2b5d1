//! The closed type algebra (§3) and the runtime value shapes (`File`, `Directory`,
//! `DefaultValue`) that flow through loading, coercion and command-line rendering.

use crate::inputs::CommandLineBinding;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use sha1::{Digest, Sha1};
use std::{fs, path::Path, str::FromStr};

/// A field of a [`RecordSchema`].
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: CWLType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_binding: Option<CommandLineBinding>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecordSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<RecordField>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnumSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub symbols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_binding: Option<CommandLineBinding>,
}

/// The closed type algebra of §3: every CWL type, in every surface form,
/// normalizes to one of these variants.
#[derive(Debug, Default, PartialEq, Clone)]
pub enum CWLType {
    #[default]
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    File,
    Directory,
    Any,
    Stdout,
    Stderr,
    Optional(Box<CWLType>),
    Array(Box<CWLType>),
    Union(Vec<CWLType>),
    Record(RecordSchema),
    Enum(EnumSchema),
    /// A bare type name (e.g. `FastqPair`) not yet resolved against a
    /// `SchemaDefRequirement`. Never observed outside the loader: resolution
    /// happens before a [`crate::requirements::Requirement`] list is handed
    /// back to callers.
    Named(String),
}

impl FromStr for CWLType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = s.strip_suffix('?') {
            Ok(CWLType::Optional(Box::new(inner.parse()?)))
        } else if let Some(inner) = s.strip_suffix("[]") {
            Ok(CWLType::Array(Box::new(inner.parse()?)))
        } else {
            match s {
                "null" => Ok(CWLType::Null),
                "boolean" => Ok(CWLType::Boolean),
                "int" => Ok(CWLType::Int),
                "long" => Ok(CWLType::Long),
                "float" => Ok(CWLType::Float),
                "double" => Ok(CWLType::Double),
                "string" => Ok(CWLType::String),
                "File" => Ok(CWLType::File),
                "Directory" => Ok(CWLType::Directory),
                "Any" => Ok(CWLType::Any),
                "stdout" => Ok(CWLType::Stdout),
                "stderr" => Ok(CWLType::Stderr),
                "record" | "enum" | "array" => Err(format!("bare '{s}' requires a schema object, not a string")),
                _ if !s.is_empty() => Ok(CWLType::Named(s.to_string())),
                _ => Err("empty type string".to_string()),
            }
        }
    }
}

impl CWLType {
    pub fn is_optional(&self) -> bool {
        matches!(self, CWLType::Optional(_)) || matches!(self, CWLType::Union(types) if types.iter().any(|t| matches!(t, CWLType::Null)))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, CWLType::Array(_))
    }

    /// Unwraps one level of `Optional`/nullable-`Union` sugar, if present.
    pub fn inner(&self) -> &CWLType {
        match self {
            CWLType::Optional(inner) => inner,
            _ => self,
        }
    }
}

fn serialize_type(t: &CWLType) -> Value {
    match t {
        CWLType::Optional(inner) => Value::String(format!("{}?", serialize_type_str(inner))),
        CWLType::Array(inner) if is_plain(inner) => Value::String(format!("{}[]", serialize_type_str(inner))),
        CWLType::Union(types) => Value::Sequence(types.iter().map(serialize_type).collect()),
        CWLType::Record(schema) => serde_yaml::to_value(record_with_type(schema)).unwrap_or(Value::Null),
        CWLType::Enum(schema) => serde_yaml::to_value(enum_with_type(schema)).unwrap_or(Value::Null),
        CWLType::Array(inner) => {
            let mut map = serde_yaml::Mapping::new();
            map.insert(Value::String("type".into()), Value::String("array".into()));
            map.insert(Value::String("items".into()), serialize_type(inner));
            Value::Mapping(map)
        }
        CWLType::Named(name) => Value::String(name.clone()),
        _ => Value::String(serialize_type_str(t)),
    }
}

fn is_plain(t: &CWLType) -> bool {
    matches!(
        t,
        CWLType::Null
            | CWLType::Boolean
            | CWLType::Int
            | CWLType::Long
            | CWLType::Float
            | CWLType::Double
            | CWLType::String
            | CWLType::File
            | CWLType::Directory
            | CWLType::Any
            | CWLType::Stdout
            | CWLType::Stderr
            | CWLType::Named(_)
            | CWLType::Optional(_)
            | CWLType::Array(_)
    )
}

fn serialize_type_str(t: &CWLType) -> String {
    match t {
        CWLType::Optional(inner) => format!("{}?", serialize_type_str(inner)),
        CWLType::Array(inner) => format!("{}[]", serialize_type_str(inner)),
        CWLType::Null => "null".to_string(),
        CWLType::Boolean => "boolean".to_string(),
        CWLType::Int => "int".to_string(),
        CWLType::Long => "long".to_string(),
        CWLType::Float => "float".to_string(),
        CWLType::Double => "double".to_string(),
        CWLType::String => "string".to_string(),
        CWLType::File => "File".to_string(),
        CWLType::Directory => "Directory".to_string(),
        CWLType::Any => "Any".to_string(),
        CWLType::Stdout => "stdout".to_string(),
        CWLType::Stderr => "stderr".to_string(),
        CWLType::Named(name) => name.clone(),
        CWLType::Union(_) | CWLType::Record(_) | CWLType::Enum(_) => "object".to_string(),
    }
}

#[derive(Serialize)]
struct RecordWithType<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: &'a Option<String>,
    fields: &'a Vec<RecordField>,
}

fn record_with_type(schema: &RecordSchema) -> RecordWithType<'_> {
    RecordWithType { type_: "record", name: &schema.name, fields: &schema.fields }
}

#[derive(Serialize)]
struct EnumWithType<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: &'a Option<String>,
    symbols: &'a Vec<String>,
}

fn enum_with_type(schema: &EnumSchema) -> EnumWithType<'_> {
    EnumWithType { type_: "enum", name: &schema.name, symbols: &schema.symbols }
}

impl<'de> Deserialize<'de> for CWLType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        parse_type_value(value).map_err(serde::de::Error::custom)
    }
}

/// Parses a `type:` field in any of its surface forms: bare string (possibly
/// `?`/`[]`-suffixed), an array (union), or a `record`/`enum`/`array` schema
/// object. This is the normalization step described in §4.2.
pub fn parse_type_value(value: Value) -> Result<CWLType, String> {
    match value {
        Value::String(s) => s.parse(),
        Value::Sequence(seq) => {
            let mut types = seq.into_iter().map(parse_type_value).collect::<Result<Vec<_>, _>>()?;
            if types.len() == 2 {
                if let Some(null_pos) = types.iter().position(|t| matches!(t, CWLType::Null)) {
                    let other = types.remove(1 - null_pos);
                    return Ok(CWLType::Optional(Box::new(other)));
                }
            }
            Ok(CWLType::Union(types))
        }
        Value::Mapping(ref map) => {
            let kind = map
                .get(Value::String("type".to_string()))
                .and_then(Value::as_str)
                .ok_or("schema object missing 'type'")?;
            match kind {
                "record" => {
                    let schema: RecordSchema = serde_yaml::from_value(value).map_err(|e| e.to_string())?;
                    Ok(CWLType::Record(schema))
                }
                "enum" => {
                    let schema: EnumSchema = serde_yaml::from_value(value).map_err(|e| e.to_string())?;
                    Ok(CWLType::Enum(schema))
                }
                "array" => {
                    let items = map.get(Value::String("items".to_string())).ok_or("array schema missing 'items'")?;
                    let items_type = parse_type_value(items.clone())?;
                    Ok(CWLType::Array(Box::new(items_type)))
                }
                other => other.parse(),
            }
        }
        other => Err(format!("cannot parse type from {other:?}")),
    }
}

impl Serialize for CWLType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serialize_type(self).serialize(serializer)
    }
}

/// A declared input with no job value and no default (§4.4/§4.5 "Uninstantiated
/// inputs"). Carries the parameter's own id so renderers can name it back;
/// serializes as `$id`, the form it takes wherever it surfaces in output.
#[derive(Debug, PartialEq, Clone)]
pub struct UninstantiatedVar(pub String);

impl Serialize for UninstantiatedVar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("${}", self.0))
    }
}

#[derive(Serialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum DefaultValue {
    File(File),
    Directory(Directory),
    Array(Vec<DefaultValue>),
    /// Field order mirrors declaration order, not a `HashMap`, so that
    /// round-tripping a record value is deterministic (§8 invariant 1).
    Record(Vec<(String, DefaultValue)>),
    Any(Value),
    Uninstantiated(UninstantiatedVar),
}

impl DefaultValue {
    pub fn as_value_string(&self) -> String {
        match self {
            DefaultValue::File(item) => item.location.as_ref().unwrap_or(&String::new()).clone(),
            DefaultValue::Directory(item) => item.location.as_ref().unwrap_or(&String::new()).clone(),
            DefaultValue::Array(items) => items.iter().map(DefaultValue::as_value_string).collect::<Vec<_>>().join(" "),
            DefaultValue::Record(_) => String::new(),
            DefaultValue::Any(value) => match value {
                Value::Bool(_) => String::new(), // do not remove: boolean flags render via prefix-only, never their value
                _ => serde_yaml::to_string(value).unwrap_or_default().trim_end().to_string(),
            },
            DefaultValue::Uninstantiated(var) => format!("${}", var.0),
        }
    }

    pub fn is_uninstantiated(&self) -> bool {
        matches!(self, DefaultValue::Uninstantiated(_))
    }

    pub fn uninstantiated_id(&self) -> Option<&str> {
        match self {
            DefaultValue::Uninstantiated(var) => Some(&var.0),
            _ => None,
        }
    }

    pub fn has_matching_type(&self, cwl_type: &CWLType) -> bool {
        match (self, cwl_type) {
            (DefaultValue::Uninstantiated(_), _) => true,
            (_, CWLType::Any) => true,
            (DefaultValue::File(_), CWLType::File) => true,
            (DefaultValue::Directory(_), CWLType::Directory) => true,
            (DefaultValue::Any(Value::Null), CWLType::Optional(_)) => true,
            (_, CWLType::Optional(inner)) => self.has_matching_type(inner),
            (_, CWLType::Union(types)) => types.iter().any(|t| self.has_matching_type(t)),
            (DefaultValue::Array(items), CWLType::Array(inner)) => items.iter().all(|i| i.has_matching_type(inner)),
            (DefaultValue::Array(_), CWLType::Any) => true,
            (DefaultValue::Any(Value::Sequence(_)), CWLType::Array(_)) => true,
            (DefaultValue::Record(fields), CWLType::Record(schema)) => schema
                .fields
                .iter()
                .all(|f| fields.iter().find(|(n, _)| n == &f.name).is_some_and(|(_, v)| v.has_matching_type(&f.type_))),
            (DefaultValue::Any(Value::String(s)), CWLType::Enum(schema)) => schema.symbols.contains(s),
            (DefaultValue::Any(inner), cwl_type) => match inner {
                Value::Bool(_) => matches!(cwl_type, CWLType::Boolean),
                Value::Number(num) => {
                    if num.is_i64() || num.is_u64() {
                        matches!(cwl_type, CWLType::Int | CWLType::Long)
                    } else {
                        matches!(cwl_type, CWLType::Float | CWLType::Double)
                    }
                }
                Value::String(_) => matches!(cwl_type, CWLType::String),
                Value::Sequence(_) => matches!(cwl_type, CWLType::Array(_)),
                Value::Mapping(_) => false,
                Value::Null => matches!(cwl_type, CWLType::Null),
                _ => false,
            },
            _ => false,
        }
    }

    pub fn to_default_value(&self) -> DefaultValue {
        match self {
            DefaultValue::File(file) => DefaultValue::File(File::from_location(file.path.as_ref().unwrap_or(&String::new()))),
            DefaultValue::Directory(dir) => DefaultValue::Directory(Directory::from_location(dir.path.as_ref().unwrap_or(&String::new()))),
            DefaultValue::Array(items) => DefaultValue::Array(items.iter().map(DefaultValue::to_default_value).collect()),
            DefaultValue::Record(fields) => DefaultValue::Record(fields.iter().map(|(k, v)| (k.clone(), v.to_default_value())).collect()),
            DefaultValue::Any(val) => DefaultValue::Any(val.clone()),
            DefaultValue::Uninstantiated(var) => DefaultValue::Uninstantiated(var.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Value = Deserialize::deserialize(deserializer)?;

        if let Value::Sequence(seq) = &value {
            return seq
                .iter()
                .cloned()
                .map(|v| DefaultValue::deserialize(v.into_deserializer()))
                .collect::<Result<Vec<_>, _>>()
                .map(DefaultValue::Array);
        }

        let location = value.get("location").or_else(|| value.get("path")).and_then(Value::as_str);

        if let Some(location_str) = location {
            let secondary_files = value
                .get("secondaryFiles")
                .map(|v| serde_yaml::from_value(v.clone()))
                .transpose()
                .map_err(serde::de::Error::custom)?;

            let basename = value
                .get("basename")
                .map(|v| serde_yaml::from_value(v.clone()))
                .transpose()
                .map_err(serde::de::Error::custom)?;

            match value.get("class").and_then(Value::as_str) {
                Some("File") => {
                    let format = value
                        .get("format")
                        .map(|v| serde_yaml::from_value(v.clone()))
                        .transpose()
                        .map_err(serde::de::Error::custom)?;
                    let mut item = File::from_location(&location_str.to_string());
                    item.secondary_files = secondary_files;
                    item.basename = basename;
                    item.format = format;
                    Ok(DefaultValue::File(item))
                }
                Some("Directory") => {
                    let mut item = Directory::from_location(&location_str.to_string());
                    item.secondary_files = secondary_files;
                    item.basename = basename;
                    Ok(DefaultValue::Directory(item))
                }
                _ => Ok(DefaultValue::Any(value)),
            }
        } else {
            Ok(DefaultValue::Any(value))
        }
    }
}

// A tiny shim so we can re-enter `Deserialize` on an already-parsed `Value`
// without pulling in serde_yaml's (private) value deserializer type by name.
trait IntoValueDeserializer {
    fn into_deserializer(self) -> Value;
}
impl IntoValueDeserializer for Value {
    fn into_deserializer(self) -> Value {
        self
    }
}

/// Tries to guess the CWLType of a given value
pub fn guess_type(value: &str) -> CWLType {
    let path = Path::new(value);
    if path.exists() {
        if path.is_file() {
            return CWLType::File;
        }
        if path.is_dir() {
            return CWLType::Directory;
        }
    }
    let Ok(yaml_value) = serde_yaml::from_str::<Value>(value) else {
        return CWLType::String;
    };
    match yaml_value {
        Value::Null => CWLType::Null,
        Value::Bool(_) => CWLType::Boolean,
        Value::Number(number) => {
            if number.is_f64() {
                CWLType::Float
            } else {
                CWLType::Int
            }
        }
        Value::String(_) => CWLType::String,
        _ => CWLType::String,
    }
}

/// Infers a [`CWLType`] from a raw value, for parameters declared `Any` (§4.5).
pub fn infer_any_type(value: &DefaultValue) -> CWLType {
    match value {
        DefaultValue::File(_) => CWLType::File,
        DefaultValue::Directory(_) => CWLType::Directory,
        DefaultValue::Array(items) => {
            let inner = items.first().map(infer_any_type).unwrap_or(CWLType::Any);
            CWLType::Array(Box::new(inner))
        }
        DefaultValue::Record(fields) => CWLType::Record(RecordSchema {
            name: None,
            fields: fields
                .iter()
                .map(|(name, v)| RecordField {
                    name: name.clone(),
                    type_: infer_any_type(v),
                    doc: None,
                    input_binding: None,
                })
                .collect(),
        }),
        DefaultValue::Any(Value::Null) => CWLType::Null,
        DefaultValue::Any(Value::Bool(_)) => CWLType::Boolean,
        DefaultValue::Any(Value::Number(n)) => {
            if n.is_f64() {
                CWLType::Float
            } else {
                CWLType::Int
            }
        }
        DefaultValue::Any(Value::String(_)) => CWLType::String,
        DefaultValue::Any(Value::Sequence(seq)) => {
            let inner = seq.first().cloned().map(|v| infer_any_type(&DefaultValue::Any(v))).unwrap_or(CWLType::Any);
            CWLType::Array(Box::new(inner))
        }
        DefaultValue::Any(_) => CWLType::Any,
        DefaultValue::Uninstantiated(_) => CWLType::Any,
    }
}

pub trait PathItem {
    fn get_location(&self) -> String;
    fn set_location(&mut self, new_location: String);
    fn secondary_files_mut(&mut self) -> Option<&mut Vec<DefaultValue>>;
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameroot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nameext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_files: Option<Vec<DefaultValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

impl Default for File {
    fn default() -> Self {
        Self {
            class: String::from("File"),
            location: None,
            path: None,
            basename: None,
            dirname: None,
            nameroot: None,
            nameext: None,
            checksum: None,
            size: None,
            secondary_files: None,
            format: None,
            contents: None,
        }
    }
}

/// Bytes read for `loadContents`, per §4.5.
pub const LOAD_CONTENTS_LIMIT: usize = 64 * 1024;

impl File {
    pub fn from_location(location: &String) -> Self {
        File {
            location: Some(location.to_string()),
            ..Default::default()
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        File {
            path: Some(path.as_ref().to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    /// Fills in the derived fields (`path`, `basename`, `dirname`, `nameroot`,
    /// `nameext`) against `doc_dir`, per invariant 3 in §3. Does not read the
    /// file unless `load_contents` is set, in which case up to
    /// [`LOAD_CONTENTS_LIMIT`] bytes are captured.
    pub fn evaluate(&self, doc_dir: &Path, load_contents: bool) -> Self {
        let raw = self.path.clone().or_else(|| self.location.clone()).unwrap_or_default();
        let raw = raw.strip_prefix("file://").unwrap_or(&raw).to_string();
        let resolved = if Path::new(&raw).is_absolute() { Path::new(&raw).to_path_buf() } else { doc_dir.join(&raw) };

        let contents = if load_contents {
            fs::read(&resolved).ok().map(|bytes| {
                let truncated = &bytes[..bytes.len().min(LOAD_CONTENTS_LIMIT)];
                String::from_utf8_lossy(truncated).into_owned()
            })
        } else {
            self.contents.clone()
        };

        Self {
            class: self.class.clone(),
            location: self.location.clone().or_else(|| Some(format!("file://{}", resolved.display()))),
            path: Some(resolved.to_string_lossy().into_owned()),
            basename: self.basename.clone().or_else(|| resolved.file_name().map(|f| f.to_string_lossy().into_owned())),
            dirname: resolved.parent().map(|p| p.to_string_lossy().into_owned()),
            nameroot: self.nameroot.clone().or_else(|| resolved.file_stem().map(|f| f.to_string_lossy().into_owned())),
            nameext: self.nameext.clone().or_else(|| resolved.extension().map(|e| format!(".{}", e.to_string_lossy()))),
            checksum: self.checksum.clone(),
            size: self.size.or_else(|| fs::metadata(&resolved).ok().map(|m| m.len())),
            secondary_files: self.secondary_files.clone(),
            format: resolve_format(self.format.clone()),
            contents,
        }
    }

    pub fn snapshot(&self) -> Self {
        let loc = self.location.clone().unwrap_or_default();
        let path = Path::new(&loc);
        let hash = fs::read(path).ok().map(|bytes| {
            let mut hasher = Sha1::new();
            hasher.update(&bytes);
            format!("sha1${:x}", hasher.finalize())
        });
        let metadata = fs::metadata(path).ok();

        Self {
            path: Some(loc.clone()),
            basename: path.file_name().map(|f| f.to_string_lossy().into_owned()),
            nameroot: path.file_stem().map(|f| f.to_string_lossy().into_owned()),
            nameext: path.extension().map(|f| format!(".{}", f.to_string_lossy())),
            checksum: hash,
            size: metadata.map(|m| m.len()),
            secondary_files: self.secondary_files.clone(),
            format: resolve_format(self.format.clone()),
            ..Default::default()
        }
    }
}

fn resolve_format(format: Option<String>) -> Option<String> {
    format.map(|format| {
        let edam_url = "http://edamontology.org/";
        format.replace("edam:", edam_url)
    })
}

impl PathItem for File {
    fn set_location(&mut self, new_location: String) {
        self.location = Some(new_location);
    }

    fn secondary_files_mut(&mut self) -> Option<&mut Vec<DefaultValue>> {
        self.secondary_files.as_mut()
    }

    fn get_location(&self) -> String {
        self.location.as_ref().unwrap_or(&String::new()).clone()
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_files: Option<Vec<DefaultValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<Vec<DefaultValue>>,
}

impl Default for Directory {
    fn default() -> Self {
        Self {
            class: String::from("Directory"),
            location: None,
            path: None,
            secondary_files: None,
            basename: None,
            listing: None,
        }
    }
}

impl Directory {
    pub fn from_location(location: &String) -> Self {
        Directory {
            location: Some(location.to_string()),
            ..Default::default()
        }
    }

    pub fn evaluate(&self, doc_dir: &Path) -> Self {
        let raw = self.path.clone().or_else(|| self.location.clone()).unwrap_or_default();
        let raw = raw.strip_prefix("file://").unwrap_or(&raw).to_string();
        let resolved = if Path::new(&raw).is_absolute() { Path::new(&raw).to_path_buf() } else { doc_dir.join(&raw) };

        Self {
            class: self.class.clone(),
            location: self.location.clone().or_else(|| Some(format!("file://{}", resolved.display()))),
            path: Some(resolved.to_string_lossy().into_owned()),
            secondary_files: self.secondary_files.clone(),
            basename: self.basename.clone().or_else(|| resolved.file_name().map(|f| f.to_string_lossy().into_owned())),
            listing: self.listing.clone(),
        }
    }
}

impl PathItem for Directory {
    fn set_location(&mut self, new_location: String) {
        self.location = Some(new_location);
    }

    fn secondary_files_mut(&mut self) -> Option<&mut Vec<DefaultValue>> {
        self.secondary_files.as_mut()
    }

    fn get_location(&self) -> String {
        self.location.as_ref().unwrap_or(&String::new()).clone()
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum EnviromentDefs {
    Vec(Vec<EnvironmentDef>),
    Map(std::collections::HashMap<String, String>),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Dirent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entryname: Option<String>,
    pub entry: Entry,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub writable: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum Entry {
    Source(String),
    Include(Include),
}

impl Default for Entry {
    fn default() -> Self {
        Entry::Source(String::new())
    }
}

impl Entry {
    pub fn from_file(path: &str) -> Entry {
        Entry::Include(Include { include: path.to_string() })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Include {
    #[serde(rename = "$include")]
    pub include: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentDef {
    pub env_name: String,
    pub env_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::CommandInputParameter;

    #[test]
    pub fn test_deserialize_nullable_type() {
        let yaml = r"
- str:
  type: string?
- number:
  type: int?
- boolean:
  type: boolean
";
        let inputs: Vec<CommandInputParameter> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(inputs[0].type_, CWLType::Optional(Box::new(CWLType::String)));
        assert_eq!(inputs[1].type_, CWLType::Optional(Box::new(CWLType::Int)));
        assert_eq!(inputs[2].type_, CWLType::Boolean);
    }

    #[test]
    pub fn test_deserialize_array_type() {
        let yaml = r"
- str:
  type: string[]
- number:
  type: int[]
";
        let inputs: Vec<CommandInputParameter> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(inputs[0].type_, CWLType::Array(Box::new(CWLType::String)));
        assert_eq!(inputs[1].type_, CWLType::Array(Box::new(CWLType::Int)));
    }

    #[test]
    pub fn test_deserialize_union_type() {
        let yaml = "type: [int, string]";
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(rename = "type")]
            type_: CWLType,
        }
        let wrapper: Wrapper = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(wrapper.type_, CWLType::Union(vec![CWLType::Int, CWLType::String]));
    }

    #[test]
    pub fn test_deserialize_optional_via_union_array() {
        let yaml = "type: [null, string]";
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(rename = "type")]
            type_: CWLType,
        }
        let wrapper: Wrapper = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(wrapper.type_, CWLType::Optional(Box::new(CWLType::String)));
    }

    #[test]
    pub fn test_deserialize_record_type() {
        let yaml = r"
type: record
fields:
  - name: chr
    type: string
  - name: start
    type: int
";
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(flatten)]
            type_: CWLTypeField,
        }
        #[derive(Deserialize)]
        struct CWLTypeField {
            #[serde(rename = "type")]
            type_: CWLType,
        }
        let wrapper: Wrapper = serde_yaml::from_str(yaml).unwrap();
        let CWLType::Record(schema) = wrapper.type_.type_ else { panic!("expected record") };
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.fields[0].name, "chr");
    }

    #[test]
    pub fn test_serialize_nullable_type() {
        let t = CWLType::Optional(Box::new(CWLType::String));
        assert_eq!(serialize_type_str(&t), "string?");
    }

    #[test]
    pub fn test_serialize_array_type() {
        let t = CWLType::Array(Box::new(CWLType::String));
        assert_eq!(serialize_type_str(&t), "string[]");
    }

    #[test]
    pub fn test_matching_types() {
        let default_value_null = DefaultValue::Any(Value::Null);
        let default_value_bool = DefaultValue::Any(Value::Bool(true));
        let default_value_int = DefaultValue::Any(Value::Number(42.into()));
        let default_value_float = DefaultValue::Any(Value::Number(42.5.into()));
        let default_value_string = DefaultValue::Any(Value::String("Hello".to_string()));
        let default_value_array = DefaultValue::Array(vec![
            DefaultValue::Any(Value::String("Hello".to_string())),
            DefaultValue::Any(Value::String("World".to_string())),
        ]);

        assert!(default_value_bool.has_matching_type(&CWLType::Boolean));
        assert!(default_value_int.has_matching_type(&CWLType::Int));
        assert!(default_value_int.has_matching_type(&CWLType::Long));
        assert!(default_value_float.has_matching_type(&CWLType::Float));
        assert!(default_value_float.has_matching_type(&CWLType::Double));
        assert!(default_value_string.has_matching_type(&CWLType::String));
        assert!(!default_value_string.has_matching_type(&CWLType::Int));

        assert!(default_value_bool.has_matching_type(&CWLType::Optional(Box::new(CWLType::Boolean))));
        assert!(default_value_int.has_matching_type(&CWLType::Optional(Box::new(CWLType::Int))));
        assert!(default_value_string.has_matching_type(&CWLType::Optional(Box::new(CWLType::String))));
        assert!(!default_value_string.has_matching_type(&CWLType::Optional(Box::new(CWLType::Int))));

        assert!(default_value_array.has_matching_type(&CWLType::Array(Box::new(CWLType::String))));
        assert!(!default_value_array.has_matching_type(&CWLType::String));
        assert!(default_value_array.has_matching_type(&CWLType::Any));

        assert!(default_value_null.has_matching_type(&CWLType::Null));
        assert!(default_value_null.has_matching_type(&CWLType::Optional(Box::new(CWLType::String))));
    }

    #[test]
    pub fn test_resolve_format() {
        let result = resolve_format(Some("edam:format_1234".to_string())).unwrap();
        assert_eq!(result, "http://edamontology.org/format_1234".to_string());
    }

    #[test]
    pub fn test_guess_type() {
        let inputs = &[
            ("../../README.md", CWLType::File),
            ("/some/path/that/does/not/exist.txt", CWLType::String),
            ("src/", CWLType::Directory),
            ("--option", CWLType::String),
            ("2", CWLType::Int),
            ("1.5", CWLType::Float),
        ];

        for input in inputs {
            let t = guess_type(input.0);
            assert_eq!(t, input.1, "guessing type of {:?}", input.0);
        }
    }

    #[test]
    pub fn test_uninstantiated_renders_as_dollar_id() {
        let value = DefaultValue::Uninstantiated(UninstantiatedVar("message".to_string()));
        assert_eq!(value.as_value_string(), "$message");
        assert!(value.is_uninstantiated());
        assert!(value.has_matching_type(&CWLType::File));
        assert_eq!(serde_yaml::to_string(&value).unwrap().trim(), "$message");
    }

    #[test]
    pub fn test_infer_any_type() {
        assert_eq!(infer_any_type(&DefaultValue::Any(Value::Null)), CWLType::Null);
        assert_eq!(infer_any_type(&DefaultValue::Any(Value::Bool(true))), CWLType::Boolean);
        assert_eq!(infer_any_type(&DefaultValue::File(File::default())), CWLType::File);
        assert_eq!(
            infer_any_type(&DefaultValue::Array(vec![DefaultValue::Any(Value::String("x".into()))])),
            CWLType::Array(Box::new(CWLType::String))
        );
    }
}

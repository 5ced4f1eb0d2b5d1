//! `inputs:` parameter declarations, for both `CommandLineTool`/`ExpressionTool`
//! (`CommandInputParameter`) and `Workflow` steps (`WorkflowStepInputParameter`).

use crate::deserialize::{deserialize_list, Identifiable};
use crate::types::{CWLType, DefaultValue};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

#[derive(Serialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommandInputParameter {
    pub id: String,
    #[serde(rename = "type", default)]
    pub type_: CWLType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_binding: Option<CommandLineBinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub load_contents: bool,
    #[serde(default = "default_streamable")]
    pub streamable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_files: Vec<SecondaryFileSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_streamable() -> bool {
    false
}

/// The on-the-wire shape of a `CommandInputParameter`, minus `id` (supplied
/// separately by the sequence form or the mapping key) and accepting a bare
/// type string as shorthand for `{type: ...}`.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CommandInputParameterFields {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default)]
    type_: CWLType,
    #[serde(default)]
    default: Option<DefaultValue>,
    #[serde(default)]
    input_binding: Option<CommandLineBinding>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    load_contents: bool,
    #[serde(default = "default_streamable")]
    streamable: bool,
    #[serde(default)]
    secondary_files: Vec<SecondaryFileSchema>,
    #[serde(default)]
    doc: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

impl<'de> Deserialize<'de> for CommandInputParameter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let fields = match value {
            Value::String(s) => CommandInputParameterFields {
                type_: s.parse().map_err(serde::de::Error::custom)?,
                ..Default::default()
            },
            other => serde_yaml::from_value(other).map_err(serde::de::Error::custom)?,
        };
        Ok(CommandInputParameter {
            id: fields.id.unwrap_or_default(),
            type_: fields.type_,
            default: fields.default,
            input_binding: fields.input_binding,
            format: fields.format,
            load_contents: fields.load_contents,
            streamable: fields.streamable,
            secondary_files: fields.secondary_files,
            doc: fields.doc,
            label: fields.label,
        })
    }
}

impl CommandInputParameter {
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_type(mut self, type_: CWLType) -> Self {
        self.type_ = type_;
        self
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_binding(mut self, binding: CommandLineBinding) -> Self {
        self.input_binding = Some(binding);
        self
    }

    pub fn is_optional(&self) -> bool {
        self.type_.is_optional() || self.default.is_some()
    }
}

impl Identifiable for CommandInputParameter {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// A single item of `secondaryFiles:`: either a bare pattern or
/// `{pattern, required}`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum SecondaryFileSchema {
    Pattern(String),
    Schema { pattern: String, #[serde(default = "default_true")] required: bool },
}

fn default_true() -> bool {
    true
}

fn is_true(b: &bool) -> bool {
    *b
}

impl SecondaryFileSchema {
    pub fn pattern(&self) -> &str {
        match self {
            SecondaryFileSchema::Pattern(p) => p,
            SecondaryFileSchema::Schema { pattern, .. } => pattern,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            SecondaryFileSchema::Pattern(_) => true,
            SecondaryFileSchema::Schema { required, .. } => *required,
        }
    }
}

/// `inputBinding:` — how a parameter's value becomes part of the rendered
/// command line (§4.6).
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CommandLineBinding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<isize>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "valueFrom")]
    pub value_from: Option<String>,
    /// Whether a `string` value is POSIX-shell-quoted when rendered.
    /// Defaults to `true`; only `ShellCommandRequirement` tools can opt a
    /// binding out of it.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub shell_quote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_separator: Option<String>,
    /// Whether a prefix and its value are rendered as two argv entries
    /// (default) or joined with `=` into one. Defaults to `true`.
    #[serde(default = "default_true")]
    pub separate: bool,
    /// Only meaningful on a parameter of type `File`: whether the document
    /// loader should read the file's contents for expression use.
    #[serde(default, rename = "loadContents")]
    pub load_contents: bool,
}

impl Default for CommandLineBinding {
    fn default() -> Self {
        Self {
            prefix: None,
            position: None,
            value_from: None,
            shell_quote: true,
            item_separator: None,
            separate: true,
            load_contents: false,
        }
    }
}

impl CommandLineBinding {
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn with_position(mut self, position: isize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_value_from(mut self, value_from: &str) -> Self {
        self.value_from = Some(value_from.to_string());
        self
    }
}

pub(crate) fn deserialize_inputs<'de, D>(deserializer: D) -> Result<Vec<CommandInputParameter>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_list(deserializer)
}

/// How a `WorkflowStepInputParameter` combines multiple `source:` values
/// into one.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "lowercase")]
pub enum LinkMerge {
    #[default]
    #[serde(rename = "merge_nested")]
    MergeNested,
    #[serde(rename = "merge_flattened")]
    MergeFlattened,
}

#[derive(Serialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStepInputParameter {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_source", rename = "source")]
    pub source: Option<SourceRefs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "valueFrom")]
    pub value_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_merge: Option<LinkMerge>,
}

/// The on-the-wire shape of a `WorkflowStepInputParameter`, minus `id`.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WorkflowStepInputParameterFields {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_source", rename = "source")]
    source: Option<SourceRefs>,
    #[serde(default)]
    default: Option<DefaultValue>,
    #[serde(default, rename = "valueFrom")]
    value_from: Option<String>,
    #[serde(default)]
    link_merge: Option<LinkMerge>,
}

impl<'de> Deserialize<'de> for WorkflowStepInputParameter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let fields = match value {
            Value::String(s) => WorkflowStepInputParameterFields { source: Some(SourceRefs::Single(s)), ..Default::default() },
            other => serde_yaml::from_value(other).map_err(serde::de::Error::custom)?,
        };
        Ok(WorkflowStepInputParameter {
            id: fields.id.unwrap_or_default(),
            source: fields.source,
            default: fields.default,
            value_from: fields.value_from,
            link_merge: fields.link_merge,
        })
    }
}

/// `source:` may be a bare string or a list of strings (for a step input fed
/// by more than one upstream output).
#[derive(Serialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum SourceRefs {
    Single(String),
    Multiple(Vec<String>),
}

impl SourceRefs {
    pub fn as_vec(&self) -> Vec<&str> {
        match self {
            SourceRefs::Single(s) => vec![s.as_str()],
            SourceRefs::Multiple(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

fn deserialize_source<'de, D>(deserializer: D) -> Result<Option<SourceRefs>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(SourceRefs::Single(s))),
        Some(Value::Sequence(seq)) => {
            let strings = seq
                .into_iter()
                .map(|v| v.as_str().map(String::from).ok_or_else(|| serde::de::Error::custom("source list entries must be strings")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Some(SourceRefs::Multiple(strings)))
        }
        Some(other) => Err(serde::de::Error::custom(format!("invalid source: {other:?}"))),
    }
}

impl Identifiable for WorkflowStepInputParameter {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_inputs_sequence() {
        let yaml = r"
- id: in1
  type: string
- id: in2
  type: int
";
        let inputs: Vec<CommandInputParameter> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].id, "in1");
    }

    #[test]
    fn test_deserialize_inputs_mapping_bare_type() {
        let yaml = r"
in1: string
in2: int?
";
        let inputs: Vec<CommandInputParameter> = serde_yaml::from_str(yaml).unwrap();
        let in1 = inputs.iter().find(|i| i.id == "in1").unwrap();
        assert_eq!(in1.type_, CWLType::String);
        let in2 = inputs.iter().find(|i| i.id == "in2").unwrap();
        assert_eq!(in2.type_, CWLType::Optional(Box::new(CWLType::Int)));
    }

    #[test]
    fn test_deserialize_inputs_mapping_full_object() {
        let yaml = r"
in1:
  type: File
  inputBinding:
    prefix: --in1
";
        let inputs: Vec<CommandInputParameter> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(inputs[0].id, "in1");
        assert_eq!(inputs[0].type_, CWLType::File);
        assert_eq!(inputs[0].input_binding.as_ref().unwrap().prefix.as_deref(), Some("--in1"));
    }

    #[test]
    fn test_command_line_binding_defaults() {
        let yaml = "prefix: --out";
        let binding: CommandLineBinding = serde_yaml::from_str(yaml).unwrap();
        assert!(binding.separate);
        assert!(!binding.load_contents);
        assert!(binding.shell_quote);
    }

    #[test]
    fn test_command_line_binding_shell_quote_can_be_disabled() {
        let yaml = "prefix: --out\nshellQuote: false";
        let binding: CommandLineBinding = serde_yaml::from_str(yaml).unwrap();
        assert!(!binding.shell_quote);
    }

    #[test]
    fn test_step_input_multiple_source() {
        let yaml = r"
id: merged
source: [step1/out, step2/out]
linkMerge: merge_flattened
";
        let input: WorkflowStepInputParameter = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(input.source.unwrap().as_vec(), vec!["step1/out", "step2/out"]);
        assert_eq!(input.link_merge, Some(LinkMerge::MergeFlattened));
    }
}

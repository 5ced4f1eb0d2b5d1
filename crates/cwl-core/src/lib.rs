//! `commonwl` — the typed document model for CWL v1.0 tools and workflows:
//! schema loading (§4.1), the closed type algebra (§3), and a path navigator
//! over the loaded value graph (§4.3).

pub mod clt;
pub mod deserialize;
pub mod error;
pub mod et;
pub mod inputs;
pub mod loader;
pub mod navigator;
pub mod outputs;
pub mod requirements;
pub mod types;
pub mod wf;

pub use clt::CommandLineTool;
pub use error::ParseError;
pub use et::ExpressionTool;
pub use loader::{load_document, load_document_str};
pub use wf::Workflow;

use inputs::CommandInputParameter;
use requirements::{deserialize_hints, deserialize_requirements, FromRequirement, Requirement};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Fields shared by every CWL process class: `CommandLineTool`,
/// `ExpressionTool` and `Workflow`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBase {
    pub class: String,
    #[serde(rename = "cwlVersion", default)]
    pub cwl_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, deserialize_with = "inputs::deserialize_inputs")]
    pub inputs: Vec<CommandInputParameter>,
    #[serde(default, deserialize_with = "deserialize_requirements", skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,
    #[serde(default, deserialize_with = "deserialize_hints", skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Requirement>,
}

impl Default for DocumentBase {
    fn default() -> Self {
        Self {
            class: String::new(),
            cwl_version: "v1.0".to_string(),
            id: None,
            label: None,
            doc: None,
            inputs: vec![],
            requirements: vec![],
            hints: vec![],
        }
    }
}

impl DocumentBase {
    pub fn get_requirement<T>(&self) -> Option<&T>
    where
        Requirement: FromRequirement<T>,
    {
        Requirement::get(&self.requirements).or_else(|| Requirement::get(&self.hints))
    }
}

/// The three CWL v1.0 process classes, dispatched on `class:` at parse time.
#[derive(Debug, PartialEq, Clone)]
pub enum CWLDocument {
    CommandLineTool(CommandLineTool),
    Workflow(Workflow),
    ExpressionTool(ExpressionTool),
}

impl CWLDocument {
    pub fn class(&self) -> &str {
        match self {
            CWLDocument::CommandLineTool(t) => &t.base.class,
            CWLDocument::Workflow(w) => &w.base.class,
            CWLDocument::ExpressionTool(e) => &e.base.class,
        }
    }

    pub fn base(&self) -> &DocumentBase {
        match self {
            CWLDocument::CommandLineTool(t) => &t.base,
            CWLDocument::Workflow(w) => &w.base,
            CWLDocument::ExpressionTool(e) => &e.base,
        }
    }

    pub fn inputs(&self) -> &[CommandInputParameter] {
        &self.base().inputs
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut Vec<CommandInputParameter> {
        match self {
            CWLDocument::CommandLineTool(t) => &mut t.base.inputs,
            CWLDocument::Workflow(w) => &mut w.base.inputs,
            CWLDocument::ExpressionTool(e) => &mut e.base.inputs,
        }
    }

    /// Output parameter types needing named-type resolution. Workflow
    /// outputs carry a type too, but are resolved against the workflow's own
    /// registry, not a nested step's, so only `CommandLineTool`/
    /// `ExpressionTool` participate here.
    pub(crate) fn output_types_mut(&mut self) -> Vec<&mut types::CWLType> {
        match self {
            CWLDocument::CommandLineTool(t) => t.outputs.iter_mut().map(|o| &mut o.type_).collect(),
            CWLDocument::ExpressionTool(e) => e.outputs.iter_mut().map(|o| &mut o.type_).collect(),
            CWLDocument::Workflow(w) => w.outputs.iter_mut().map(|o| &mut o.type_).collect(),
        }
    }

    pub fn get_requirement<T>(&self) -> Option<&T>
    where
        Requirement: FromRequirement<T>,
    {
        self.base().get_requirement()
    }
}

impl<'de> Deserialize<'de> for CWLDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        let class = value.get("class").and_then(serde_yaml::Value::as_str).ok_or_else(|| serde::de::Error::custom("missing 'class'"))?;
        match class {
            "CommandLineTool" => Ok(CWLDocument::CommandLineTool(serde_yaml::from_value(value).map_err(serde::de::Error::custom)?)),
            "Workflow" => Ok(CWLDocument::Workflow(serde_yaml::from_value(value).map_err(serde::de::Error::custom)?)),
            "ExpressionTool" => Ok(CWLDocument::ExpressionTool(serde_yaml::from_value(value).map_err(serde::de::Error::custom)?)),
            other => Err(serde::de::Error::custom(format!("unknown class '{other}'"))),
        }
    }
}

impl Serialize for CWLDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            CWLDocument::CommandLineTool(t) => t.serialize(serializer),
            CWLDocument::Workflow(w) => w.serialize(serializer),
            CWLDocument::ExpressionTool(e) => e.serialize(serializer),
        }
    }
}

pub fn load_tool(path: &Path) -> Result<CommandLineTool, ParseError> {
    match load_document(path)? {
        CWLDocument::CommandLineTool(tool) => Ok(tool),
        other => Err(ParseError::UnknownClass { class: other.class().to_string(), location: path.display().to_string() }),
    }
}

pub fn load_workflow(path: &Path) -> Result<Workflow, ParseError> {
    match load_document(path)? {
        CWLDocument::Workflow(workflow) => Ok(workflow),
        other => Err(ParseError::UnknownClass { class: other.class().to_string(), location: path.display().to_string() }),
    }
}

pub fn load_expression_tool(path: &Path) -> Result<ExpressionTool, ParseError> {
    match load_document(path)? {
        CWLDocument::ExpressionTool(tool) => Ok(tool),
        other => Err(ParseError::UnknownClass { class: other.class().to_string(), location: path.display().to_string() }),
    }
}

//! `class: Workflow` — a DAG of steps, each running a tool, expression tool,
//! or nested workflow.

use crate::deserialize::{deserialize_list, Identifiable};
use crate::outputs::WorkflowOutputParameter;
use crate::requirements::{deserialize_hints, deserialize_requirements, Requirement};
use crate::CWLDocument;
use crate::DocumentBase;
use serde::{Deserialize, Deserializer, Serialize};
use std::ops::{Deref, DerefMut};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Workflow {
    #[serde(flatten)]
    pub base: DocumentBase,
    #[serde(default, deserialize_with = "deserialize_workflow_outputs")]
    pub outputs: Vec<WorkflowOutputParameter>,
    #[serde(default, deserialize_with = "deserialize_steps")]
    pub steps: Vec<WorkflowStep>,
}

impl Default for Workflow {
    fn default() -> Self {
        Self {
            base: DocumentBase { class: "Workflow".to_string(), ..Default::default() },
            outputs: vec![],
            steps: vec![],
        }
    }
}

impl Deref for Workflow {
    type Target = DocumentBase;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

impl DerefMut for Workflow {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.base
    }
}

fn deserialize_workflow_outputs<'de, D>(deserializer: D) -> Result<Vec<WorkflowOutputParameter>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_list(deserializer)
}

impl Workflow {
    pub fn has_step(&self, id: &str) -> bool {
        self.steps.iter().any(|s| s.id == id)
    }

    pub fn has_input(&self, id: &str) -> bool {
        self.inputs.iter().any(|i| i.id == id)
    }

    pub fn has_output(&self, id: &str) -> bool {
        self.outputs.iter().any(|o| o.id == id)
    }

    pub fn has_step_output(&self, step_id: &str, output_id: &str) -> bool {
        self.get_step(step_id).is_some_and(|s| s.out.contains(&output_id.to_string()))
    }

    pub fn get_step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    #[serde(default)]
    pub id: String,
    pub run: StringOrDocument,
    #[serde(default, rename = "in", deserialize_with = "deserialize_step_inputs")]
    pub in_: Vec<crate::inputs::WorkflowStepInputParameter>,
    #[serde(default)]
    pub out: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scatter: Option<ScatterInputs>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "scatterMethod")]
    pub scatter_method: Option<ScatterMethod>,
    #[serde(default, deserialize_with = "deserialize_requirements", skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<Requirement>,
    #[serde(default, deserialize_with = "deserialize_hints", skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Requirement>,
}

impl Identifiable for WorkflowStep {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<WorkflowStep>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_list(deserializer)
}

fn deserialize_step_inputs<'de, D>(deserializer: D) -> Result<Vec<crate::inputs::WorkflowStepInputParameter>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_list(deserializer)
}

/// `scatter:` names one or more step inputs to iterate over.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum ScatterInputs {
    Single(String),
    Multiple(Vec<String>),
}

impl ScatterInputs {
    pub fn as_vec(&self) -> Vec<&str> {
        match self {
            ScatterInputs::Single(s) => vec![s.as_str()],
            ScatterInputs::Multiple(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub enum ScatterMethod {
    #[default]
    #[serde(rename = "dot_product")]
    DotProduct,
    #[serde(rename = "nested_crossproduct")]
    NestedCrossproduct,
    #[serde(rename = "flat_crossproduct")]
    FlatCrossproduct,
}

/// `run:` is either a reference to another document's path (or a fragment
/// `#id`), or an inline embedded document.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum StringOrDocument {
    String(String),
    Document(Box<CWLDocument>),
}

impl Default for StringOrDocument {
    fn default() -> Self {
        StringOrDocument::String(String::new())
    }
}
